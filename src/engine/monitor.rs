//! Focused monitoring of scan candidates
//!
//! Each round re-fetches both legs of every tracking candidate, folds the
//! new spread into its running extremes, and sends alert-level spreads
//! through confirmation. Confirmed alerts are notified, recorded in the
//! cooldown table, and the candidate leaves the active set. Whatever is
//! still tracking when the window closes expires silently.

use super::confirm::{Confirmation, Confirmer};
use super::cooldown::AlertCooldown;
use super::fanout::{QuoteFetcher, QuoteRequest};
use super::{Candidate, CandidateState};
use crate::notify::{Alert, Notifier};
use crate::spread::{Direction, SpreadCalculator};
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use crate::venue::VenueSide;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What happened during one monitoring window
#[derive(Debug, Default)]
pub struct MonitorReport {
    pub rounds: u32,
    pub alerts: Vec<Alert>,
    /// Confirmations that did not repeat the alert spread
    pub rejected: usize,
    /// Alert-level spreads skipped because of the cooldown
    pub cooled_down: usize,
    /// Candidates discarded at window end
    pub expired: usize,
}

/// Runs focused monitoring windows
pub struct Monitor {
    fetcher: QuoteFetcher,
    confirmer: Confirmer,
    calculator: SpreadCalculator,
    alert_threshold: Decimal,
    poll_interval: Duration,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        fetcher: QuoteFetcher,
        confirmer: Confirmer,
        calculator: SpreadCalculator,
        alert_threshold: Decimal,
        poll_interval: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            confirmer,
            calculator,
            alert_threshold,
            poll_interval,
            notifier,
        }
    }

    /// Monitor `candidates` until `window_end` or until none remain
    pub async fn run(
        &self,
        mut candidates: HashMap<String, Candidate>,
        window_end: Instant,
        cooldown: &mut AlertCooldown,
    ) -> anyhow::Result<MonitorReport> {
        let mut report = MonitorReport::default();

        tracing::info!(
            candidates = candidates.len(),
            remaining_ms = window_end.saturating_duration_since(Instant::now()).as_millis() as u64,
            "Focused monitoring started"
        );

        while Instant::now() < window_end && !candidates.is_empty() {
            let round_start = Instant::now();

            self.round(&mut candidates, cooldown, &mut report).await?;
            report.rounds += 1;

            let elapsed = round_start.elapsed();
            telemetry::record_latency(LatencyMetric::MonitorRound, elapsed);

            if let Some(rest) = self.poll_interval.checked_sub(elapsed) {
                tokio::time::sleep(rest).await;
            }
        }

        for (symbol, mut candidate) in candidates {
            candidate.state = CandidateState::Expired;
            report.expired += 1;
            telemetry::increment(CounterMetric::CandidatesExpired);
            tracing::debug!(
                symbol = %symbol,
                first = %candidate.first_spread.round_dp(4),
                max = %candidate.max_spread.round_dp(4),
                min = %candidate.min_spread.round_dp(4),
                "Candidate expired"
            );
        }

        tracing::info!(
            rounds = report.rounds,
            alerts = report.alerts.len(),
            rejected = report.rejected,
            expired = report.expired,
            "Focused monitoring finished"
        );

        Ok(report)
    }

    /// One fetch-then-evaluate round
    async fn round(
        &self,
        candidates: &mut HashMap<String, Candidate>,
        cooldown: &mut AlertCooldown,
        report: &mut MonitorReport,
    ) -> anyhow::Result<()> {
        let requests: Vec<QuoteRequest> = candidates
            .iter()
            .filter(|(_, c)| c.is_tracking())
            .flat_map(|(symbol, c)| {
                [
                    QuoteRequest::new(VenueSide::A, symbol.as_str(), symbol.as_str()),
                    QuoteRequest::new(VenueSide::B, symbol.as_str(), c.native_b.as_str()),
                ]
            })
            .collect();

        // Every fetch of the round has completed before evaluation starts
        let quotes = self.fetcher.fetch(requests).await?;

        let mut symbols: Vec<String> = candidates.keys().cloned().collect();
        symbols.sort();

        for symbol in symbols {
            let Some((quote_a, quote_b)) = quotes.pair(&symbol) else {
                continue;
            };
            let Some(spread) = self.calculator.between(&quote_a, &quote_b) else {
                continue;
            };
            let Some(candidate) = candidates.get_mut(&symbol) else {
                continue;
            };

            candidate.observe(spread);

            if spread.abs() < self.alert_threshold {
                continue;
            }

            if cooldown.in_cooldown(&symbol, Instant::now()) {
                report.cooled_down += 1;
                tracing::debug!(symbol = %symbol, spread = %spread.round_dp(4), "Alert suppressed by cooldown");
                continue;
            }

            candidate.state = CandidateState::Confirming;
            let native_b = candidate.native_b.clone();

            tracing::info!(
                symbol = %symbol,
                spread = %spread.round_dp(4),
                "Alert threshold crossed, confirming"
            );

            match self.confirmer.confirm(&symbol, &native_b).await {
                Confirmation::Confirmed {
                    spread,
                    quote_a,
                    quote_b,
                } => {
                    let alert = Alert {
                        symbol: symbol.clone(),
                        spread_pct: spread,
                        direction: Direction::of(spread),
                        venue_a: self.fetcher.venue(VenueSide::A).name().to_string(),
                        venue_b: self.fetcher.venue(VenueSide::B).name().to_string(),
                        quote_a,
                        quote_b,
                        timestamp: Utc::now(),
                    };

                    self.notifier.notify(&alert.render()).await;
                    cooldown.record_alert(&symbol, Instant::now());
                    telemetry::increment(CounterMetric::AlertsSent);

                    if let Some(mut done) = candidates.remove(&symbol) {
                        done.state = CandidateState::Alerted;
                    }

                    tracing::info!(
                        symbol = %symbol,
                        spread = %spread.round_dp(4),
                        direction = ?alert.direction,
                        "Spread alert sent"
                    );
                    report.alerts.push(alert);
                }
                Confirmation::Rejected { last_spread } => {
                    if let Some(candidate) = candidates.get_mut(&symbol) {
                        candidate.state = CandidateState::Tracking;
                    }
                    report.rejected += 1;
                    telemetry::increment(CounterMetric::ConfirmationsRejected);
                    tracing::info!(
                        symbol = %symbol,
                        detected = %spread.round_dp(4),
                        confirmed = ?last_spread.map(|s| s.round_dp(4)),
                        "Spread not confirmed"
                    );
                }
            }
        }

        Ok(())
    }
}
