//! Spread detection engine
//!
//! Owns the two-phase polling strategy: a broad scan over every reconciled
//! instrument, then a focused monitoring window over the candidates it
//! promotes. The [`Engine`] is the single owner of all mutable state
//! (symbol snapshot, cooldown table, candidate set) and drives the outer
//! control loop.

mod candidate;
mod confirm;
mod cooldown;
mod fanout;
mod monitor;
mod scan;

pub use candidate::{Candidate, CandidateState};
pub use confirm::{Confirmation, Confirmer};
pub use cooldown::AlertCooldown;
pub use fanout::{QuoteFetcher, QuoteRequest, RoundQuotes};
pub use monitor::{Monitor, MonitorReport};
pub use scan::Scanner;

use crate::config::Config;
use crate::notify::Notifier;
use crate::spread::SpreadCalculator;
use crate::symbol::{Reconciler, SymbolMap};
use crate::telemetry::{self, CounterMetric};
use crate::venue::MarketData;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Engine tuning derived from the configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scan_threshold: Decimal,
    pub alert_threshold: Decimal,
    pub dead_zone: Decimal,
    pub max_workers: usize,
    pub window: Duration,
    pub poll_interval: Duration,
    pub confirm_delay: Duration,
    pub confirm_attempts: u32,
    pub alert_cooldown: Duration,
    pub symbol_refresh: Duration,
    pub error_backoff: Duration,
    /// Shortest sleep after a scan without candidates
    pub idle_floor: Duration,
    /// Upper bound on one single-instrument fetch including retries
    pub quote_deadline: Duration,
    /// Upper bound on the bulk book fetch including retries
    pub book_deadline: Duration,
    /// Log a heartbeat every N cycles
    pub summary_interval: u64,
    pub startup_message: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        let monitor = &config.monitor;
        let venues = &config.venues;

        Self {
            scan_threshold: monitor.scan_threshold_pct,
            alert_threshold: monitor.alert_threshold_pct,
            dead_zone: monitor.dead_zone_pct,
            max_workers: monitor.max_workers,
            window: monitor.window(),
            poll_interval: monitor.poll_interval(),
            confirm_delay: monitor.confirm_delay(),
            confirm_attempts: monitor.confirm_retries,
            alert_cooldown: monitor.alert_cooldown(),
            symbol_refresh: monitor.symbol_refresh(),
            error_backoff: monitor.error_backoff(),
            idle_floor: Duration::from_secs(1),
            quote_deadline: request_budget(
                venues.quote_timeout(),
                venues.quote_retries,
                Duration::from_millis(venues.quote_retry_delay_ms),
            ),
            book_deadline: request_budget(
                venues.bulk_timeout(),
                venues.book_retries,
                Duration::from_millis(venues.book_retry_delay_ms),
            ),
            summary_interval: monitor.summary_interval_rounds.max(1),
            startup_message: config.notify.startup_message,
        }
    }
}

/// Worst-case duration of a request retried `attempts` times
fn request_budget(timeout: Duration, attempts: u32, delay: Duration) -> Duration {
    let attempts = attempts.max(1);
    timeout * attempts + delay * (attempts - 1)
}

/// Result of one outer cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Scan found nothing; the cycle slept out the window
    Idle,
    /// Candidates were monitored for the rest of the window
    Monitored(MonitorReport),
}

/// Outer control loop and owner of all engine state
pub struct Engine {
    settings: EngineSettings,
    reconciler: Reconciler,
    scanner: Scanner,
    monitor: Monitor,
    notifier: Arc<dyn Notifier>,
    venue_names: (String, String),
    cooldown: AlertCooldown,
    symbols: SymbolMap,
    last_refresh: Option<Instant>,
    cycles: u64,
    alerts_sent: u64,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        venue_a: Arc<dyn MarketData>,
        venue_b: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let calculator = SpreadCalculator::new(settings.dead_zone);
        let fetcher = QuoteFetcher::new(
            venue_a.clone(),
            venue_b.clone(),
            settings.max_workers,
            settings.quote_deadline,
        );
        let confirmer = Confirmer::new(
            fetcher.clone(),
            calculator,
            settings.alert_threshold,
            settings.confirm_delay,
            settings.confirm_attempts,
        );

        Self {
            reconciler: Reconciler::new(venue_a.clone(), venue_b.clone()),
            scanner: Scanner::new(
                fetcher.clone(),
                calculator,
                settings.scan_threshold,
                settings.book_deadline,
            ),
            monitor: Monitor::new(
                fetcher,
                confirmer,
                calculator,
                settings.alert_threshold,
                settings.poll_interval,
                notifier.clone(),
            ),
            notifier,
            venue_names: (venue_a.name().to_string(), venue_b.name().to_string()),
            cooldown: AlertCooldown::new(settings.alert_cooldown),
            symbols: SymbolMap::default(),
            last_refresh: None,
            cycles: 0,
            alerts_sent: 0,
            settings,
        }
    }

    /// Current symbol snapshot
    pub fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn alerts_sent(&self) -> u64 {
        self.alerts_sent
    }

    /// Rebuild the symbol snapshot, replacing the previous one wholesale
    pub async fn refresh_symbols(&mut self) -> &SymbolMap {
        self.symbols = self.reconciler.reconcile().await;
        self.last_refresh = Some(Instant::now());
        &self.symbols
    }

    fn refresh_due(&self, now: Instant) -> bool {
        self.last_refresh
            .map_or(true, |at| now.saturating_duration_since(at) >= self.settings.symbol_refresh)
    }

    /// Refresh symbols if due, then run one scan
    pub async fn scan_once(&mut self) -> anyhow::Result<HashMap<String, Candidate>> {
        if self.refresh_due(Instant::now()) {
            self.refresh_symbols().await;
        }
        self.scanner.scan(&self.symbols).await
    }

    /// One outer cycle: scan, then monitor candidates until the window closes
    pub async fn cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        let window_start = Instant::now();

        let candidates = self.scan_once().await?;

        let outcome = if candidates.is_empty() {
            let rest = self
                .settings
                .window
                .saturating_sub(window_start.elapsed())
                .max(self.settings.idle_floor);
            tracing::debug!(sleep_ms = rest.as_millis() as u64, "No candidates, waiting for next window");
            tokio::time::sleep(rest).await;
            CycleOutcome::Idle
        } else {
            let report = self
                .monitor
                .run(candidates, window_start + self.settings.window, &mut self.cooldown)
                .await?;
            self.alerts_sent += report.alerts.len() as u64;
            CycleOutcome::Monitored(report)
        };

        self.cycles += 1;
        if self.cycles % self.settings.summary_interval == 0 {
            tracing::info!(
                cycles = self.cycles,
                common_symbols = self.symbols.len(),
                alerts_sent = self.alerts_sent,
                "Monitor alive"
            );
        }

        Ok(outcome)
    }

    /// Run until Ctrl-C
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Errors from a cycle are logged and followed by a backoff; they never
    /// end the loop.
    pub async fn run_until<F>(&mut self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let (venue_a, venue_b) = &self.venue_names;
        tracing::info!(
            venue_a = %venue_a,
            venue_b = %venue_b,
            scan_threshold = %self.settings.scan_threshold,
            alert_threshold = %self.settings.alert_threshold,
            window_secs = self.settings.window.as_secs(),
            max_workers = self.settings.max_workers,
            "Spread monitor starting"
        );

        if self.settings.startup_message {
            let text = format!(
                "Spread monitor started: {} vs {}, alert threshold {}%",
                venue_a, venue_b, self.settings.alert_threshold
            );
            self.notifier.notify(&text).await;
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
            _ = self.refresh_symbols() => {}
        }

        loop {
            let result = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                result = self.cycle() => result,
            };

            if let Err(e) = result {
                telemetry::increment(CounterMetric::LoopErrors);
                tracing::error!(
                    error = ?e,
                    backoff_secs = self.settings.error_backoff.as_secs_f64(),
                    "Monitor cycle failed"
                );

                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                    _ = tokio::time::sleep(self.settings.error_backoff) => {}
                }
            }
        }

        tracing::info!(cycles = self.cycles, alerts_sent = self.alerts_sent, "Spread monitor stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::venue::Quote;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct FixedVenue {
        name: &'static str,
        instruments: Vec<String>,
        quotes: HashMap<String, Quote>,
        panic_on_quote: bool,
    }

    impl FixedVenue {
        fn new(name: &'static str, quotes: &[(&str, Quote)]) -> Arc<Self> {
            Arc::new(Self {
                name,
                instruments: quotes.iter().map(|(s, _)| s.to_string()).collect(),
                quotes: quotes.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
                panic_on_quote: false,
            })
        }
    }

    #[async_trait]
    impl MarketData for FixedVenue {
        fn name(&self) -> &str {
            self.name
        }

        async fn list_instruments(&self) -> Vec<String> {
            self.instruments.clone()
        }

        async fn quote(&self, symbol: &str) -> Result<Quote, FetchError> {
            if self.panic_on_quote {
                panic!("venue exploded");
            }
            self.quotes.get(symbol).copied().ok_or(FetchError::Status(400))
        }

        async fn book(&self) -> Result<HashMap<String, Quote>, FetchError> {
            Ok(self.quotes.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_string());
        }
    }

    fn q(bid: Decimal, ask: Decimal) -> Quote {
        Quote::new(bid, ask).unwrap()
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            window: Duration::from_millis(150),
            poll_interval: Duration::from_millis(20),
            confirm_delay: Duration::from_millis(1),
            error_backoff: Duration::from_millis(10),
            idle_floor: Duration::from_millis(10),
            quote_deadline: Duration::from_millis(500),
            book_deadline: Duration::from_millis(500),
            ..EngineSettings::from_config(&Config::default())
        }
    }

    #[test]
    fn test_settings_from_default_config() {
        let s = EngineSettings::from_config(&Config::default());
        assert_eq!(s.scan_threshold, dec!(0.25));
        assert_eq!(s.alert_threshold, dec!(5.0));
        assert_eq!(s.window, Duration::from_secs(60));
        assert_eq!(s.confirm_attempts, 1);
        // one 6s attempt
        assert_eq!(s.quote_deadline, Duration::from_secs(6));
        assert_eq!(s.book_deadline, Duration::from_secs(10));
        assert!(s.startup_message);
    }

    #[test]
    fn test_request_budget_includes_retry_delays() {
        let budget = request_budget(Duration::from_secs(2), 3, Duration::from_millis(500));
        assert_eq!(budget, Duration::from_secs(7));
        assert_eq!(
            request_budget(Duration::from_secs(2), 0, Duration::from_secs(9)),
            Duration::from_secs(2)
        );
    }

    #[tokio::test]
    async fn test_cycle_idle_without_candidates() {
        let a = FixedVenue::new("A", &[("BTCUSDT", q(dec!(60000), dec!(60010)))]);
        let b = FixedVenue::new("B", &[("XBTUSDTM", q(dec!(60001), dec!(60011)))]);
        let mut engine = Engine::new(settings(), a, b, Arc::new(Recorder::default()));

        let outcome = engine.cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Idle));
        assert_eq!(engine.symbols().len(), 1);
        assert_eq!(engine.cycles(), 1);
    }

    #[tokio::test]
    async fn test_cycle_alerts_once_per_window() {
        let a = FixedVenue::new("A", &[("BTCUSDT", q(dec!(60000), dec!(60010)))]);
        let b = FixedVenue::new("B", &[("XBTUSDTM", q(dec!(63200), dec!(63210)))]);
        let notifier = Arc::new(Recorder::default());
        let mut engine = Engine::new(settings(), a, b, notifier.clone());

        let outcome = engine.cycle().await.unwrap();

        match outcome {
            CycleOutcome::Monitored(report) => assert_eq!(report.alerts.len(), 1),
            other => panic!("expected monitoring, got {other:?}"),
        }
        assert_eq!(engine.alerts_sent(), 1);
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);

        // Still inside the cooldown: the next window stays quiet
        engine.cycle().await.unwrap();
        assert_eq!(engine.alerts_sent(), 1);
    }

    #[tokio::test]
    async fn test_run_until_sends_startup_and_stops() {
        let a = FixedVenue::new("A", &[("BTCUSDT", q(dec!(60000), dec!(60010)))]);
        let b = FixedVenue::new("B", &[("XBTUSDTM", q(dec!(60001), dec!(60011)))]);
        let notifier = Arc::new(Recorder::default());
        let mut engine = Engine::new(settings(), a, b, notifier.clone());

        engine
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Spread monitor started"));
    }

    #[tokio::test]
    async fn test_run_until_survives_cycle_errors() {
        let a = FixedVenue::new("A", &[("BTCUSDT", q(dec!(60000), dec!(60010)))]);
        let b = Arc::new(FixedVenue {
            name: "B",
            instruments: vec!["XBTUSDTM".to_string()],
            quotes: HashMap::new(),
            panic_on_quote: true,
        });
        let mut engine = Engine::new(
            EngineSettings {
                startup_message: false,
                ..settings()
            },
            a,
            b,
            Arc::new(Recorder::default()),
        );

        engine
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(engine.cycles(), 0);
    }
}
