//! Symbol reconciliation module
//!
//! Normalizes venue-native instrument names to canonical symbols and
//! builds the set of instruments listed on both venues.

mod normalize;
mod reconcile;

pub use normalize::{
    normalize, BaseAlias, Normalizer, SuffixRule, DEFAULT_ALIASES, DEFAULT_SUFFIX_RULES,
};
pub use reconcile::{Reconciler, SymbolMap};
