//! Signed percentage spread between two venues

use crate::venue::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Which leg to buy to capture a spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Venue B bids above venue A's ask: buy A, sell B
    LongAShortB,
    /// Venue B asks below venue A's bid: buy B, sell A
    LongBShortA,
}

impl Direction {
    /// Direction implied by the sign of a spread
    pub fn of(spread: Decimal) -> Self {
        if spread > Decimal::ZERO {
            Direction::LongAShortB
        } else {
            Direction::LongBShortA
        }
    }

    /// Human readable label using the venues' names
    pub fn label(&self, venue_a: &str, venue_b: &str) -> String {
        match self {
            Direction::LongAShortB => format!("Long {venue_a} / Short {venue_b}"),
            Direction::LongBShortA => format!("Long {venue_b} / Short {venue_a}"),
        }
    }
}

/// Spread calculator with a dead zone around zero
#[derive(Debug, Clone, Copy)]
pub struct SpreadCalculator {
    dead_zone_pct: Decimal,
}

impl SpreadCalculator {
    pub fn new(dead_zone_pct: Decimal) -> Self {
        Self {
            dead_zone_pct: dead_zone_pct.abs(),
        }
    }

    /// Signed spread in percent, or `None` when there is no actionable direction.
    ///
    /// Positive: `(bid_b - ask_a) / ask_a * 100`, when above the dead zone.
    /// Negative: `(ask_b - bid_a) / bid_a * 100`, when below minus the dead zone.
    /// Any non-positive input, or a ratio too large to represent, yields `None`.
    pub fn compute(
        &self,
        bid_a: Decimal,
        ask_a: Decimal,
        bid_b: Decimal,
        ask_b: Decimal,
    ) -> Option<Decimal> {
        if [bid_a, ask_a, bid_b, ask_b]
            .iter()
            .any(|p| *p <= Decimal::ZERO)
        {
            return None;
        }

        let long_a = (bid_b - ask_a)
            .checked_div(ask_a)?
            .checked_mul(dec!(100))?;
        if long_a > self.dead_zone_pct {
            return Some(long_a);
        }

        let long_b = (ask_b - bid_a)
            .checked_div(bid_a)?
            .checked_mul(dec!(100))?;
        if long_b < -self.dead_zone_pct {
            return Some(long_b);
        }

        None
    }

    /// Spread between two validated quotes
    pub fn between(&self, a: &Quote, b: &Quote) -> Option<Decimal> {
        self.compute(a.bid(), a.ask(), b.bid(), b.ask())
    }
}

impl Default for SpreadCalculator {
    fn default() -> Self {
        Self::new(dec!(0.01))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> SpreadCalculator {
        SpreadCalculator::default()
    }

    #[test]
    fn test_long_a_short_b() {
        let spread = calc()
            .compute(dec!(100), dec!(101), dec!(102), dec!(103))
            .unwrap();
        assert_eq!(spread.round_dp(3), dec!(0.990));
        assert_eq!(Direction::of(spread), Direction::LongAShortB);
    }

    #[test]
    fn test_long_b_short_a() {
        let spread = calc()
            .compute(dec!(103), dec!(104), dec!(100), dec!(101))
            .unwrap();
        assert_eq!(spread.round_dp(3), dec!(-1.942));
        assert_eq!(Direction::of(spread), Direction::LongBShortA);
    }

    #[test]
    fn test_dead_zone_is_none() {
        // Overlapping books: both directional spreads are negative-ish or tiny
        assert_eq!(
            calc().compute(dec!(100), dec!(100.005), dec!(100.005), dec!(100.006)),
            None
        );
        // Identical books
        assert_eq!(
            calc().compute(dec!(100), dec!(100.01), dec!(100), dec!(100.01)),
            None
        );
    }

    #[test]
    fn test_dead_zone_boundary_excluded() {
        // long_a exactly 0.01% is not strictly above the dead zone
        assert_eq!(
            calc().compute(dec!(99), dec!(100), dec!(100.01), dec!(101)),
            None
        );
        assert!(calc()
            .compute(dec!(99), dec!(100), dec!(100.02), dec!(101))
            .is_some());
    }

    #[test]
    fn test_non_positive_inputs() {
        let c = calc();
        assert_eq!(c.compute(dec!(0), dec!(101), dec!(110), dec!(111)), None);
        assert_eq!(c.compute(dec!(100), dec!(0), dec!(110), dec!(111)), None);
        assert_eq!(c.compute(dec!(100), dec!(101), dec!(-1), dec!(111)), None);
        assert_eq!(c.compute(dec!(100), dec!(101), dec!(110), dec!(0)), None);
    }

    #[test]
    fn test_unrepresentable_ratio_is_none() {
        let a = Quote::new(dec!(0.000000000000000001), dec!(0.000000000000000001)).unwrap();
        let b = Quote::new(dec!(1000000000), dec!(1000000001)).unwrap();
        assert_eq!(calc().between(&a, &b), None);
    }

    #[test]
    fn test_end_to_end_scan_values() {
        let scan = calc()
            .compute(dec!(60000), dec!(60010), dec!(60200), dec!(60210))
            .unwrap();
        assert_eq!(scan.round_dp(3), dec!(0.317));

        let alert = calc()
            .compute(dec!(60000), dec!(60010), dec!(63200), dec!(63210))
            .unwrap();
        assert_eq!(alert.round_dp(2), dec!(5.32));
    }

    #[test]
    fn test_between_quotes() {
        let a = Quote::new(dec!(100), dec!(101)).unwrap();
        let b = Quote::new(dec!(102), dec!(103)).unwrap();
        assert!(calc().between(&a, &b).unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_direction_label() {
        assert_eq!(
            Direction::LongAShortB.label("Binance", "KuCoin"),
            "Long Binance / Short KuCoin"
        );
        assert_eq!(
            Direction::LongBShortA.label("Binance", "KuCoin"),
            "Long KuCoin / Short Binance"
        );
    }
}
