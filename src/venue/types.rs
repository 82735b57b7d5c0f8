//! Market data types

use crate::error::FetchError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Best bid/ask for one instrument on one venue at one sampling instant.
///
/// Both sides are strictly positive; construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    bid: Decimal,
    ask: Decimal,
}

impl Quote {
    /// Build a quote, rejecting non-positive prices
    pub fn new(bid: Decimal, ask: Decimal) -> Result<Self, FetchError> {
        if bid <= Decimal::ZERO || ask <= Decimal::ZERO {
            return Err(FetchError::InvalidQuote);
        }
        Ok(Self { bid, ask })
    }

    /// Build a quote from raw exchange price fields.
    ///
    /// Missing or unparsable fields count as zero and yield `InvalidQuote`.
    pub fn from_raw(bid: Option<&PriceField>, ask: Option<&PriceField>) -> Result<Self, FetchError> {
        let bid = bid.and_then(PriceField::value).unwrap_or(Decimal::ZERO);
        let ask = ask.and_then(PriceField::value).unwrap_or(Decimal::ZERO);
        Self::new(bid, ask)
    }

    pub fn bid(&self) -> Decimal {
        self.bid
    }

    pub fn ask(&self) -> Decimal {
        self.ask
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.bid, self.ask)
    }
}

/// Price as sent by an exchange: either a JSON string or a JSON number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Number(f64),
}

impl PriceField {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            PriceField::Text(s) => Decimal::from_str(s.trim()).ok(),
            PriceField::Number(n) => Decimal::try_from(*n).ok(),
        }
    }
}

/// Which side of the comparison a venue sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueSide {
    /// Venue A, the bulk-book venue
    A,
    /// Venue B, quoted per instrument
    B,
}
