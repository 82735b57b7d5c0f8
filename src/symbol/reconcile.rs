//! Cross-venue symbol reconciliation

use super::Normalizer;
use crate::telemetry::{self, GaugeMetric};
use crate::venue::MarketData;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Snapshot of the instruments tradable on both venues.
///
/// Built wholesale by [`Reconciler::reconcile`] and replaced as a unit;
/// never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap {
    common: BTreeSet<String>,
    native_b: HashMap<String, String>,
}

impl SymbolMap {
    /// Build from the two venues' native symbol lists.
    ///
    /// The common set is the intersection of both normalized sets. The
    /// venue-B native map keeps the first symbol seen per canonical key,
    /// in venue-B list order.
    pub fn build(venue_a: &[String], venue_b: &[String], normalizer: &Normalizer) -> Self {
        let set_a: BTreeSet<String> = venue_a.iter().map(|s| normalizer.normalize(s)).collect();

        let mut set_b = BTreeSet::new();
        let mut native_b = HashMap::new();
        for native in venue_b {
            let canonical = normalizer.normalize(native);
            native_b
                .entry(canonical.clone())
                .or_insert_with(|| native.clone());
            set_b.insert(canonical);
        }

        let common: BTreeSet<String> = set_a.intersection(&set_b).cloned().collect();
        native_b.retain(|canonical, _| common.contains(canonical));

        Self { common, native_b }
    }

    /// Canonical symbols listed on both venues, in sorted order
    pub fn common(&self) -> &BTreeSet<String> {
        &self.common
    }

    pub fn len(&self) -> usize {
        self.common.len()
    }

    pub fn is_empty(&self) -> bool {
        self.common.is_empty()
    }

    /// Venue-B native symbol for a canonical symbol.
    ///
    /// Falls back to the KuCoin `M` convention when no mapping exists.
    pub fn native_b(&self, canonical: &str) -> String {
        self.native_b
            .get(canonical)
            .cloned()
            .unwrap_or_else(|| format!("{canonical}M"))
    }

    /// Pairs of (canonical, venue-B native) for every common symbol
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.common.iter().map(|c| (c.as_str(), self.native_b(c)))
    }

    /// First few common symbols, for logging
    pub fn sample(&self, n: usize) -> Vec<&str> {
        self.common.iter().take(n).map(String::as_str).collect()
    }
}

/// Builds [`SymbolMap`] snapshots from live venue catalogs
pub struct Reconciler {
    venue_a: Arc<dyn MarketData>,
    venue_b: Arc<dyn MarketData>,
    normalizer: Normalizer,
}

impl Reconciler {
    pub fn new(venue_a: Arc<dyn MarketData>, venue_b: Arc<dyn MarketData>) -> Self {
        Self::with_normalizer(venue_a, venue_b, Normalizer::default())
    }

    pub fn with_normalizer(
        venue_a: Arc<dyn MarketData>,
        venue_b: Arc<dyn MarketData>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            venue_a,
            venue_b,
            normalizer,
        }
    }

    /// Fetch both catalogs and build a fresh snapshot.
    ///
    /// A venue that cannot be reached contributes an empty list, which
    /// yields an empty common set rather than an error.
    pub async fn reconcile(&self) -> SymbolMap {
        let (list_a, list_b) = tokio::join!(
            self.venue_a.list_instruments(),
            self.venue_b.list_instruments()
        );

        let map = SymbolMap::build(&list_a, &list_b, &self.normalizer);

        tracing::info!(
            venue_a = self.venue_a.name(),
            venue_a_count = list_a.len(),
            venue_b = self.venue_b.name(),
            venue_b_count = list_b.len(),
            common = map.len(),
            sample = ?map.sample(8),
            "Reconciled common symbols"
        );
        telemetry::set_gauge(GaugeMetric::CommonSymbols, map.len() as f64);

        map
    }
}
