//! Venue symbol normalization
//!
//! Each venue decorates the same underlying perpetual differently
//! (KuCoin appends an `M` margin marker, some listings carry a `P`).
//! Normalization strips those decorations with an ordered rule list.

/// One suffix strip rule: when a symbol ends with `suffix`, drop the
/// last `strip` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixRule {
    pub suffix: &'static str,
    pub strip: usize,
}

impl SuffixRule {
    pub const fn new(suffix: &'static str, strip: usize) -> Self {
        Self { suffix, strip }
    }

    fn apply<'a>(&self, symbol: &'a str) -> Option<&'a str> {
        if !symbol.ends_with(self.suffix) || symbol.len() <= self.strip {
            return None;
        }
        let end = symbol.len() - self.strip;
        if symbol.is_char_boundary(end) {
            Some(&symbol[..end])
        } else {
            None
        }
    }
}

/// Base-asset rename applied after suffix stripping (e.g. KuCoin's `XBT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseAlias {
    pub from: &'static str,
    pub to: &'static str,
}

/// Default suffix rules, first match wins
pub const DEFAULT_SUFFIX_RULES: &[SuffixRule] = &[
    SuffixRule::new("USDTM", 1),
    SuffixRule::new("USDTP", 1),
    SuffixRule::new("M", 1),
];

/// Default base aliases
pub const DEFAULT_ALIASES: &[BaseAlias] = &[BaseAlias {
    from: "XBT",
    to: "BTC",
}];

/// Maps venue-native symbols to canonical symbols. Pure, no I/O.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<SuffixRule>,
    aliases: Vec<BaseAlias>,
}

impl Normalizer {
    pub fn new(rules: Vec<SuffixRule>, aliases: Vec<BaseAlias>) -> Self {
        Self { rules, aliases }
    }

    /// Normalize to a canonical symbol.
    ///
    /// Upper-cases, then applies the first matching suffix rule repeatedly
    /// until none matches, then rewrites an aliased base prefix. Running
    /// to a fixed point makes the result idempotent.
    pub fn normalize(&self, symbol: &str) -> String {
        let upper = symbol.trim().to_ascii_uppercase();
        let mut current = upper.as_str();

        while let Some(stripped) = self.rules.iter().find_map(|r| r.apply(current)) {
            current = stripped;
        }

        for alias in &self.aliases {
            if let Some(rest) = current.strip_prefix(alias.from) {
                if !rest.is_empty() {
                    return format!("{}{}", alias.to, rest);
                }
            }
        }

        current.to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX_RULES.to_vec(), DEFAULT_ALIASES.to_vec())
    }
}

/// Normalize with the default rules
pub fn normalize(symbol: &str) -> String {
    Normalizer::default().normalize(symbol)
}
