//! perp-spread: cross-venue perpetual futures spread monitor
//!
//! This library provides the core components for:
//! - Market data from Binance USDⓈ-M and KuCoin futures
//! - Symbol reconciliation across both instrument catalogs
//! - Spread calculation with a dead zone and trade direction
//! - Broad scanning and focused monitoring of candidates
//! - Alert confirmation, cooldown and Telegram delivery
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod spread;
pub mod symbol;
pub mod telemetry;
pub mod venue;
