//! CLI interface for perp-spread
//!
//! Provides subcommands for:
//! - `run`: Start the long-running spread monitor
//! - `scan`: Reconcile symbols and run a single scan
//! - `symbols`: Show the reconciled symbol map
//! - `config`: Show the effective configuration

mod run;
mod scan;
mod symbols;

pub use run::RunArgs;
pub use scan::ScanArgs;
pub use symbols::SymbolsArgs;

use crate::config::Config;
use crate::venue::{BinanceFutures, KucoinFutures, MarketData};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "perp-spread")]
#[command(about = "Cross-venue perpetual futures spread monitor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the spread monitor
    Run(RunArgs),
    /// Run one scan and print the candidates
    Scan(ScanArgs),
    /// Print the symbols listed on both venues
    Symbols(SymbolsArgs),
    /// Show the effective configuration
    Config,
}

/// Venue clients sharing one HTTP connection pool
pub(crate) struct Venues {
    pub http: reqwest::Client,
    pub a: Arc<dyn MarketData>,
    pub b: Arc<dyn MarketData>,
}

impl Venues {
    pub(crate) fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(config.monitor.max_workers.max(1))
            .build()?;

        Ok(Self {
            a: Arc::new(BinanceFutures::new(http.clone(), &config.venues)),
            b: Arc::new(KucoinFutures::new(http.clone(), &config.venues)),
            http,
        })
    }
}
