//! Prometheus metrics

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full scan (bulk book + venue B fan-out)
    Scan,
    /// One focused monitoring round
    MonitorRound,
    /// Confirmation re-sample, including the pause
    Confirmation,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Instruments listed on both venues
    CommonSymbols,
    /// Candidates promoted by the latest scan
    Candidates,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed scans
    Scans,
    /// Alerts delivered to the notifier
    AlertsSent,
    /// Confirmations that failed to repeat the alert spread
    ConfirmationsRejected,
    /// Candidates discarded at window end without alerting
    CandidatesExpired,
    /// Errors caught by the control loop
    LoopErrors,
}

/// Install the Prometheus exporter on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Scan => "perpspread_scan_latency_ms",
        LatencyMetric::MonitorRound => "perpspread_round_latency_ms",
        LatencyMetric::Confirmation => "perpspread_confirmation_latency_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::CommonSymbols => "perpspread_common_symbols",
        GaugeMetric::Candidates => "perpspread_candidates",
    };

    metrics::gauge!(metric_name).set(value);
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    let metric_name = match metric {
        CounterMetric::Scans => "perpspread_scan_total",
        CounterMetric::AlertsSent => "perpspread_alerts_total",
        CounterMetric::ConfirmationsRejected => "perpspread_confirmations_rejected_total",
        CounterMetric::CandidatesExpired => "perpspread_candidates_expired_total",
        CounterMetric::LoopErrors => "perpspread_loop_errors_total",
    };

    metrics::counter!(metric_name).increment(1);
}

/// Count a failed quote fetch by venue and reason code
pub fn record_fetch_failure(venue: &str, reason: &'static str) {
    metrics::counter!(
        "perpspread_fetch_failures_total",
        "venue" => venue.to_string(),
        "reason" => reason
    )
    .increment(1);
}
