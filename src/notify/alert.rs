//! Alert message rendering

use crate::spread::Direction;
use crate::venue::Quote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A confirmed spread alert
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Canonical symbol
    pub symbol: String,
    /// Confirmed spread in percent, signed
    pub spread_pct: Decimal,
    /// Trade direction implied by the spread sign
    pub direction: Direction,
    pub venue_a: String,
    pub venue_b: String,
    /// Confirmation quote on venue A
    pub quote_a: Quote,
    /// Confirmation quote on venue B
    pub quote_b: Quote,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Render as a Telegram Markdown message
    pub fn render(&self) -> String {
        let pad = self.venue_a.len().max(self.venue_b.len());
        format!(
            "*BIG SPREAD ALERT*\n\
             `{symbol}` → *{spread:+.4}%*\n\
             Direction → {direction}\n\
             {venue_a:<pad$}: `{a_bid:.6}` ↔ `{a_ask:.6}`\n\
             {venue_b:<pad$}: `{b_bid:.6}` ↔ `{b_ask:.6}`\n\
             {ts}",
            symbol = self.symbol,
            spread = self.spread_pct,
            direction = self.direction.label(&self.venue_a, &self.venue_b),
            venue_a = self.venue_a,
            venue_b = self.venue_b,
            a_bid = self.quote_a.bid(),
            a_ask = self.quote_a.ask(),
            b_bid = self.quote_b.bid(),
            b_ask = self.quote_b.ask(),
            ts = self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn alert(spread: Decimal) -> Alert {
        Alert {
            symbol: "BTCUSDT".to_string(),
            spread_pct: spread,
            direction: Direction::of(spread),
            venue_a: "Binance".to_string(),
            venue_b: "KuCoin".to_string(),
            quote_a: Quote::new(dec!(60000), dec!(60010)).unwrap(),
            quote_b: Quote::new(dec!(63200), dec!(63210)).unwrap(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_long_a() {
        let text = alert(dec!(5.3158)).render();
        let expected = "*BIG SPREAD ALERT*\n\
                        `BTCUSDT` → *+5.3158%*\n\
                        Direction → Long Binance / Short KuCoin\n\
                        Binance: `60000.000000` ↔ `60010.000000`\n\
                        KuCoin : `63200.000000` ↔ `63210.000000`\n\
                        2026-01-01 00:00:00 UTC";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_negative_spread() {
        let text = alert(dec!(-6.5)).render();
        assert!(text.contains("*-6.5000%*"));
        assert!(text.contains("Long KuCoin / Short Binance"));
    }
}
