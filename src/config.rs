//! Configuration types for perp-spread

use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub venues: VenueConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Spread detection, monitoring and alerting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Spread magnitude (%) that promotes an instrument to candidate
    pub scan_threshold_pct: Decimal,

    /// Spread magnitude (%) that triggers confirmation and alerting
    pub alert_threshold_pct: Decimal,

    /// Directional spreads inside +/- this band (%) are treated as no spread
    pub dead_zone_pct: Decimal,

    /// Minimum time between two alerts for the same instrument
    pub alert_cooldown_secs: u64,

    /// Log a heartbeat every N outer cycles
    pub summary_interval_rounds: u64,

    /// Maximum concurrent fetches per round
    pub max_workers: usize,

    /// Length of one scan + focused monitoring window
    pub window_secs: u64,

    /// Target interval between monitoring rounds
    pub poll_interval_secs: u64,

    /// Pause before the confirmation re-sample
    pub confirm_delay_ms: u64,

    /// Number of confirmation re-samples (1 = single shot)
    pub confirm_retries: u32,

    /// Interval between symbol catalog refreshes
    pub symbol_refresh_secs: u64,

    /// Pause after an unexpected failure in the control loop
    pub error_backoff_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_threshold_pct: Decimal::new(25, 2),  // 0.25%
            alert_threshold_pct: Decimal::new(50, 1), // 5.0%
            dead_zone_pct: Decimal::new(1, 2),        // 0.01%
            alert_cooldown_secs: 60,
            summary_interval_rounds: 20,
            max_workers: 4,
            window_secs: 60,
            poll_interval_secs: 5,
            confirm_delay_ms: 500,
            confirm_retries: 1,
            symbol_refresh_secs: 900,
            error_backoff_secs: 5,
        }
    }
}

impl MonitorConfig {
    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn symbol_refresh(&self) -> Duration {
        Duration::from_secs(self.symbol_refresh_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Exchange REST endpoints, timeouts and retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VenueConfig {
    pub binance_base_url: String,
    pub kucoin_base_url: String,

    /// Timeout for catalog and bulk book requests
    pub bulk_timeout_secs: u64,

    /// Timeout for single-instrument quote requests
    pub quote_timeout_secs: u64,

    pub list_retries: u32,
    pub list_retry_delay_ms: u64,
    pub quote_retries: u32,
    pub quote_retry_delay_ms: u64,
    pub book_retries: u32,
    pub book_retry_delay_ms: u64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            binance_base_url: "https://fapi.binance.com".to_string(),
            kucoin_base_url: "https://api-futures.kucoin.com".to_string(),
            bulk_timeout_secs: 10,
            quote_timeout_secs: 6,
            list_retries: 2,
            list_retry_delay_ms: 700,
            quote_retries: 1,
            quote_retry_delay_ms: 200,
            book_retries: 1,
            book_retry_delay_ms: 500,
        }
    }
}

impl VenueConfig {
    pub fn bulk_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_timeout_secs)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Telegram bot token (falls back to the TELEGRAM_TOKEN env var)
    #[serde(skip_serializing)]
    pub telegram_token: Option<String>,

    /// Chats that receive every alert
    pub telegram_chat_ids: Vec<String>,

    pub timeout_secs: u64,

    /// Send a message when the monitor starts
    pub startup_message: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_chat_ids: Vec::new(),
            timeout_secs: 10,
            startup_message: true,
        }
    }
}

impl NotifyConfig {
    /// Token from the config file, else from the environment
    pub fn resolved_token(&self) -> Option<String> {
        self.telegram_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("TELEGRAM_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.monitor;

        if m.scan_threshold_pct <= Decimal::ZERO {
            return Err(invalid("monitor.scan_threshold_pct", "must be positive"));
        }
        if m.alert_threshold_pct < m.scan_threshold_pct {
            return Err(invalid(
                "monitor.alert_threshold_pct",
                "must not be below scan_threshold_pct",
            ));
        }
        if m.dead_zone_pct < Decimal::ZERO {
            return Err(invalid("monitor.dead_zone_pct", "must not be negative"));
        }
        if m.max_workers == 0 {
            return Err(invalid("monitor.max_workers", "must be at least 1"));
        }
        if m.window_secs == 0 {
            return Err(invalid("monitor.window_secs", "must be at least 1"));
        }
        if m.poll_interval_secs == 0 {
            return Err(invalid("monitor.poll_interval_secs", "must be at least 1"));
        }
        if m.confirm_retries == 0 {
            return Err(invalid("monitor.confirm_retries", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [monitor]
            scan_threshold_pct = 0.3
            alert_threshold_pct = 4.5
            alert_cooldown_secs = 120
            max_workers = 8

            [venues]
            quote_timeout_secs = 3

            [notify]
            telegram_chat_ids = ["1", "2"]

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.monitor.scan_threshold_pct, dec!(0.3));
        assert_eq!(config.monitor.alert_threshold_pct, dec!(4.5));
        assert_eq!(config.monitor.alert_cooldown(), Duration::from_secs(120));
        assert_eq!(config.monitor.max_workers, 8);
        // Unset fields keep their defaults
        assert_eq!(config.monitor.window_secs, 60);
        assert_eq!(config.venues.quote_timeout(), Duration::from_secs(3));
        assert_eq!(config.venues.bulk_timeout(), Duration::from_secs(10));
        assert_eq!(config.notify.telegram_chat_ids, vec!["1", "2"]);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.monitor.scan_threshold_pct, dec!(0.25));
        assert_eq!(config.monitor.alert_threshold_pct, dec!(5.0));
        assert_eq!(config.monitor.dead_zone_pct, dec!(0.01));
        assert_eq!(config.monitor.confirm_retries, 1);
        assert_eq!(config.monitor.confirm_delay(), Duration::from_millis(500));
        assert_eq!(config.monitor.symbol_refresh(), Duration::from_secs(900));
        assert_eq!(config.venues.binance_base_url, "https://fapi.binance.com");
        assert!(config.notify.startup_message);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(include_str!("../config.toml.example")).unwrap();
        assert_eq!(config.monitor.max_workers, 4);
    }

    #[test]
    fn test_reject_zero_workers() {
        let err = Config::parse("[monitor]\nmax_workers = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "monitor.max_workers",
                ..
            }
        ));
    }

    #[test]
    fn test_reject_alert_below_scan() {
        let toml = "[monitor]\nscan_threshold_pct = 1.0\nalert_threshold_pct = 0.5";
        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_reject_zero_confirm_retries() {
        assert!(Config::parse("[monitor]\nconfirm_retries = 0").is_err());
    }

    #[test]
    fn test_reject_bad_toml() {
        let err = Config::parse("[monitor\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\nwindow_secs = 30").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.monitor.window(), Duration::from_secs(30));
    }

    #[test]
    fn test_resolved_token_prefers_config() {
        let notify = NotifyConfig {
            telegram_token: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(notify.resolved_token().as_deref(), Some("abc"));
    }
}
