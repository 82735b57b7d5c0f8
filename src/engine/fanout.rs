//! Bounded concurrent quote fetching
//!
//! One call fans out a batch of single-instrument quote requests over at
//! most `max_workers` spawned tasks and returns only after every request
//! of the batch has finished. Results land in per-instrument slots; a
//! failed or timed-out request simply leaves its slot empty.

use crate::error::FetchError;
use crate::telemetry;
use crate::venue::{MarketData, Quote, VenueSide};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One quote to fetch during a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub side: VenueSide,
    /// Canonical symbol the result is keyed by
    pub canonical: String,
    /// Native symbol sent to the venue
    pub native: String,
}

impl QuoteRequest {
    pub fn new(side: VenueSide, canonical: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            side,
            canonical: canonical.into(),
            native: native.into(),
        }
    }
}

/// Quotes collected in one round, keyed by canonical symbol
#[derive(Debug, Clone, Default)]
pub struct RoundQuotes {
    pub a: HashMap<String, Quote>,
    pub b: HashMap<String, Quote>,
    /// Requests that produced no quote
    pub failures: usize,
}

impl RoundQuotes {
    /// Both legs for a symbol, if both arrived
    pub fn pair(&self, canonical: &str) -> Option<(Quote, Quote)> {
        Some((*self.a.get(canonical)?, *self.b.get(canonical)?))
    }
}

/// Fans quote requests out to both venues
#[derive(Clone)]
pub struct QuoteFetcher {
    venue_a: Arc<dyn MarketData>,
    venue_b: Arc<dyn MarketData>,
    max_workers: usize,
    /// Upper bound on one request including its retries
    deadline: Duration,
}

impl QuoteFetcher {
    pub fn new(
        venue_a: Arc<dyn MarketData>,
        venue_b: Arc<dyn MarketData>,
        max_workers: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            venue_a,
            venue_b,
            max_workers: max_workers.max(1),
            deadline,
        }
    }

    pub fn venue(&self, side: VenueSide) -> &Arc<dyn MarketData> {
        match side {
            VenueSide::A => &self.venue_a,
            VenueSide::B => &self.venue_b,
        }
    }

    /// Fetch one quote with the per-request deadline applied
    pub async fn fetch_one(&self, side: VenueSide, native: &str) -> Result<Quote, FetchError> {
        fetch_with_deadline(self.venue(side).clone(), native.to_string(), self.deadline).await
    }

    /// Fetch every request and wait for all of them.
    ///
    /// Worker count is `min(max_workers, requests)`. Errors only when a
    /// worker task panics; fetch failures are folded into empty slots.
    pub async fn fetch(&self, requests: Vec<QuoteRequest>) -> anyhow::Result<RoundQuotes> {
        let mut round = RoundQuotes::default();
        if requests.is_empty() {
            return Ok(round);
        }

        let workers = self.max_workers.min(requests.len());
        let deadline = self.deadline;

        let results: Vec<_> = stream::iter(requests)
            .map(|req| {
                let venue = self.venue(req.side).clone();
                let native = req.native.clone();
                let handle =
                    tokio::spawn(async move { fetch_with_deadline(venue, native, deadline).await });
                async move { (req, handle.await) }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut panicked = None;
        for (req, joined) in results {
            match joined {
                Ok(Ok(quote)) => {
                    let slots = match req.side {
                        VenueSide::A => &mut round.a,
                        VenueSide::B => &mut round.b,
                    };
                    slots.insert(req.canonical, quote);
                }
                Ok(Err(e)) => {
                    round.failures += 1;
                    let venue = self.venue(req.side).name();
                    tracing::debug!(
                        venue,
                        symbol = %req.native,
                        reason = e.reason(),
                        error = %e,
                        "Quote unavailable"
                    );
                    telemetry::record_fetch_failure(venue, e.reason());
                }
                Err(join_err) => {
                    round.failures += 1;
                    panicked.get_or_insert(join_err);
                }
            }
        }

        if let Some(join_err) = panicked {
            anyhow::bail!("quote fetch task failed: {}", join_err);
        }

        Ok(round)
    }
}

async fn fetch_with_deadline(
    venue: Arc<dyn MarketData>,
    native: String,
    deadline: Duration,
) -> Result<Quote, FetchError> {
    match tokio::time::timeout(deadline, venue.quote(&native)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}
