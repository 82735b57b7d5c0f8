//! Broad scan across every reconciled instrument

use super::fanout::{QuoteFetcher, QuoteRequest};
use super::Candidate;
use crate::spread::SpreadCalculator;
use crate::symbol::SymbolMap;
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use crate::venue::VenueSide;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Promotes instruments whose spread clears the scan threshold
pub struct Scanner {
    fetcher: QuoteFetcher,
    calculator: SpreadCalculator,
    scan_threshold: Decimal,
    book_deadline: Duration,
}

impl Scanner {
    pub fn new(
        fetcher: QuoteFetcher,
        calculator: SpreadCalculator,
        scan_threshold: Decimal,
        book_deadline: Duration,
    ) -> Self {
        Self {
            fetcher,
            calculator,
            scan_threshold,
            book_deadline,
        }
    }

    /// Scan every common symbol once.
    ///
    /// Venue A's bulk book and venue B's per-instrument quotes are fetched
    /// concurrently. A symbol becomes a candidate when both quotes are present
    /// and `|spread| >= scan_threshold`. An unavailable book yields no candidates.
    pub async fn scan(&self, symbols: &SymbolMap) -> anyhow::Result<HashMap<String, Candidate>> {
        let started = Instant::now();
        let mut candidates = HashMap::new();

        if symbols.is_empty() {
            tracing::debug!("No common symbols, skipping scan");
            return Ok(candidates);
        }

        let requests: Vec<QuoteRequest> = symbols
            .pairs()
            .map(|(canonical, native)| QuoteRequest::new(VenueSide::B, canonical, native))
            .collect();

        let venue_a = self.fetcher.venue(VenueSide::A);
        let (book, quotes_b) = tokio::join!(
            tokio::time::timeout(self.book_deadline, venue_a.book()),
            self.fetcher.fetch(requests)
        );
        let quotes_b = quotes_b?;

        let book = match book {
            Ok(Ok(book)) => book,
            Ok(Err(e)) => {
                tracing::warn!(venue = venue_a.name(), reason = e.reason(), error = %e, "Bulk book unavailable");
                telemetry::record_fetch_failure(venue_a.name(), e.reason());
                return Ok(candidates);
            }
            Err(_) => {
                tracing::warn!(venue = venue_a.name(), "Bulk book timed out");
                telemetry::record_fetch_failure(venue_a.name(), "timeout");
                return Ok(candidates);
            }
        };

        for (canonical, native_b) in symbols.pairs() {
            let (Some(quote_a), Some(quote_b)) = (book.get(canonical), quotes_b.b.get(canonical))
            else {
                continue;
            };

            let Some(spread) = self.calculator.between(quote_a, quote_b) else {
                continue;
            };

            if spread.abs() >= self.scan_threshold {
                candidates.insert(canonical.to_string(), Candidate::new(native_b, spread));
            }
        }

        let elapsed = started.elapsed();
        telemetry::record_latency(LatencyMetric::Scan, elapsed);
        telemetry::increment(CounterMetric::Scans);
        telemetry::set_gauge(GaugeMetric::Candidates, candidates.len() as f64);

        tracing::info!(
            symbols = symbols.len(),
            book_size = book.len(),
            quotes_b = quotes_b.b.len(),
            failures = quotes_b.failures,
            candidates = candidates.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Scan complete"
        );

        Ok(candidates)
    }
}
