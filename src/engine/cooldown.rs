//! Per-instrument alert cooldown

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Last alert time per canonical symbol.
///
/// Entries are never removed; an entry older than the cooldown is simply
/// ignored.
#[derive(Debug)]
pub struct AlertCooldown {
    cooldown: Duration,
    last_alert: HashMap<String, Instant>,
}

impl AlertCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert: HashMap::new(),
        }
    }

    /// True while `symbol` alerted less than the cooldown ago
    pub fn in_cooldown(&self, symbol: &str, now: Instant) -> bool {
        self.last_alert
            .get(symbol)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.cooldown)
    }

    /// Record an emitted alert
    pub fn record_alert(&mut self, symbol: &str, now: Instant) {
        self.last_alert.insert(symbol.to_string(), now);
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
