//! Symbols command implementation

use super::Venues;
use crate::config::Config;
use crate::symbol::Reconciler;
use clap::Args;

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Only print the count
    #[arg(short, long)]
    pub count: bool,
}

impl SymbolsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let venues = Venues::from_config(config)?;
        let map = Reconciler::new(venues.a.clone(), venues.b.clone())
            .reconcile()
            .await;

        println!(
            "{} symbols listed on both {} and {}",
            map.len(),
            venues.a.name(),
            venues.b.name()
        );
        if !self.count {
            for (canonical, native_b) in map.pairs() {
                println!("  {canonical:<16} -> {native_b}");
            }
        }

        Ok(())
    }
}
