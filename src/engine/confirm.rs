//! Delayed re-sample that confirms a spread before alerting

use super::fanout::QuoteFetcher;
use crate::spread::SpreadCalculator;
use crate::telemetry::{self, LatencyMetric};
use crate::venue::{Quote, VenueSide};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a confirmation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A re-sample repeated the alert-level spread
    Confirmed {
        spread: Decimal,
        quote_a: Quote,
        quote_b: Quote,
    },
    /// No re-sample met the threshold
    Rejected {
        /// Spread of the last complete re-sample, if any
        last_spread: Option<Decimal>,
    },
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed { .. })
    }
}

/// Re-samples both venues after a short pause
pub struct Confirmer {
    fetcher: QuoteFetcher,
    calculator: SpreadCalculator,
    alert_threshold: Decimal,
    delay: Duration,
    attempts: u32,
}

impl Confirmer {
    pub fn new(
        fetcher: QuoteFetcher,
        calculator: SpreadCalculator,
        alert_threshold: Decimal,
        delay: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            fetcher,
            calculator,
            alert_threshold,
            delay,
            attempts: attempts.max(1),
        }
    }

    /// Re-sample up to `attempts` times, pausing before each.
    ///
    /// Returns the first sample whose spread meets the alert threshold. Each
    /// attempt stands alone; nothing from an earlier attempt leaks into the
    /// result.
    pub async fn confirm(&self, canonical: &str, native_b: &str) -> Confirmation {
        let started = Instant::now();
        let mut last_spread = None;

        for attempt in 1..=self.attempts {
            tokio::time::sleep(self.delay).await;

            let (a, b) = tokio::join!(
                self.fetcher.fetch_one(VenueSide::A, canonical),
                self.fetcher.fetch_one(VenueSide::B, native_b)
            );

            let (quote_a, quote_b) = match (a, b) {
                (Ok(a), Ok(b)) => (a, b),
                (a, b) => {
                    tracing::debug!(
                        symbol = canonical,
                        attempt,
                        venue_a_error = ?a.err(),
                        venue_b_error = ?b.err(),
                        "Confirmation sample incomplete"
                    );
                    continue;
                }
            };

            let spread = self.calculator.between(&quote_a, &quote_b);
            last_spread = spread;

            if let Some(spread) = spread.filter(|s| s.abs() >= self.alert_threshold) {
                telemetry::record_latency(LatencyMetric::Confirmation, started.elapsed());
                return Confirmation::Confirmed {
                    spread,
                    quote_a,
                    quote_b,
                };
            }
        }

        telemetry::record_latency(LatencyMetric::Confirmation, started.elapsed());
        Confirmation::Rejected { last_spread }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::venue::MarketData;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Venue that replays a queue of responses, one per call
    struct Replay {
        responses: Mutex<VecDeque<Result<Quote, FetchError>>>,
    }

    impl Replay {
        fn new(responses: Vec<Result<Quote, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl MarketData for Replay {
        fn name(&self) -> &str {
            "replay"
        }

        async fn list_instruments(&self) -> Vec<String> {
            Vec::new()
        }

        async fn quote(&self, _symbol: &str) -> Result<Quote, FetchError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Timeout))
        }
    }

    fn q(bid: Decimal, ask: Decimal) -> Result<Quote, FetchError> {
        Quote::new(bid, ask)
    }

    fn confirmer(a: Arc<Replay>, b: Arc<Replay>, attempts: u32) -> Confirmer {
        Confirmer::new(
            QuoteFetcher::new(a, b, 4, Duration::from_secs(1)),
            SpreadCalculator::default(),
            dec!(5.0),
            Duration::from_millis(1),
            attempts,
        )
    }

    #[tokio::test]
    async fn test_confirmed_carries_confirmation_quotes() {
        let a = Replay::new(vec![q(dec!(60000), dec!(60010))]);
        let b = Replay::new(vec![q(dec!(63300), dec!(63310))]);

        let result = confirmer(a, b, 1).confirm("BTCUSDT", "XBTUSDTM").await;

        match result {
            Confirmation::Confirmed {
                spread,
                quote_a,
                quote_b,
            } => {
                assert!(spread >= dec!(5.0));
                assert_eq!(quote_a.ask(), dec!(60010));
                assert_eq!(quote_b.bid(), dec!(63300));
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_when_spread_collapses() {
        let a = Replay::new(vec![q(dec!(60000), dec!(60010))]);
        let b = Replay::new(vec![q(dec!(60200), dec!(60210))]);

        let result = confirmer(a, b, 1).confirm("BTCUSDT", "XBTUSDTM").await;

        match result {
            Confirmation::Rejected { last_spread } => {
                assert_eq!(last_spread.unwrap().round_dp(3), dec!(0.317));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_when_leg_unavailable() {
        let a = Replay::new(vec![Err(FetchError::Status(500))]);
        let b = Replay::new(vec![q(dec!(63300), dec!(63310))]);

        let result = confirmer(a, b, 1).confirm("BTCUSDT", "XBTUSDTM").await;
        assert_eq!(result, Confirmation::Rejected { last_spread: None });
    }

    #[tokio::test]
    async fn test_single_shot_does_not_retry() {
        let a = Replay::new(vec![
            q(dec!(60000), dec!(60010)),
            q(dec!(60000), dec!(60010)),
        ]);
        let b = Replay::new(vec![
            q(dec!(60200), dec!(60210)),
            q(dec!(63300), dec!(63310)),
        ]);

        let result = confirmer(a, b, 1).confirm("BTCUSDT", "XBTUSDTM").await;
        assert!(!result.is_confirmed());
    }

    #[tokio::test]
    async fn test_second_attempt_can_confirm() {
        let a = Replay::new(vec![
            q(dec!(60000), dec!(60010)),
            q(dec!(60000), dec!(60010)),
        ]);
        let b = Replay::new(vec![
            q(dec!(60200), dec!(60210)),
            q(dec!(63300), dec!(63310)),
        ]);

        let result = confirmer(a, b, 2).confirm("BTCUSDT", "XBTUSDTM").await;
        assert!(result.is_confirmed());
    }
}
