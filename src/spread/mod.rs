//! Spread calculation module
//!
//! Computes signed percentage spreads between venue A and venue B quotes

mod calculator;

pub use calculator::{Direction, SpreadCalculator};
