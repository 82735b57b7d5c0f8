//! Candidate tracking records

use rust_decimal::Decimal;
use serde::Serialize;

/// Lifecycle of a candidate inside one monitoring window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CandidateState {
    /// Re-sampled every round
    Tracking,
    /// Crossed the alert threshold, awaiting the confirmation re-sample
    Confirming,
    /// Confirmed and notified; removed from the active set
    Alerted,
    /// Window ended without an alert
    Expired,
}

/// Instrument flagged by a scan for focused monitoring
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Venue-B native symbol
    pub native_b: String,
    /// Spread observed by the scan that promoted it
    pub first_spread: Decimal,
    pub max_spread: Decimal,
    pub min_spread: Decimal,
    pub state: CandidateState,
}

impl Candidate {
    pub fn new(native_b: impl Into<String>, spread: Decimal) -> Self {
        Self {
            native_b: native_b.into(),
            first_spread: spread,
            max_spread: spread,
            min_spread: spread,
            state: CandidateState::Tracking,
        }
    }

    /// Fold a new spread sample into the running extremes
    pub fn observe(&mut self, spread: Decimal) {
        self.max_spread = self.max_spread.max(spread);
        self.min_spread = self.min_spread.min(spread);
    }

    pub fn is_tracking(&self) -> bool {
        self.state == CandidateState::Tracking
    }
}
