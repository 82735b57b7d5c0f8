//! Scan command implementation

use super::Venues;
use crate::config::Config;
use crate::engine::{Engine, EngineSettings};
use crate::notify::LogNotifier;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Override the scan threshold (%)
    #[arg(short, long)]
    pub threshold: Option<rust_decimal::Decimal>,

    /// Print at most this many candidates
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

impl ScanArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let venues = Venues::from_config(config)?;

        let mut settings = EngineSettings::from_config(config);
        if let Some(threshold) = self.threshold {
            settings.scan_threshold = threshold.abs();
        }
        let threshold = settings.scan_threshold;

        let mut engine = Engine::new(settings, venues.a, venues.b, Arc::new(LogNotifier));
        let candidates = engine.scan_once().await?;

        let mut rows: Vec<_> = candidates.into_iter().collect();
        rows.sort_by(|(_, x), (_, y)| y.first_spread.abs().cmp(&x.first_spread.abs()));

        println!(
            "{} candidates above {}% across {} common symbols",
            rows.len(),
            threshold,
            engine.symbols().len()
        );
        for (symbol, candidate) in rows.iter().take(self.limit) {
            println!(
                "  {:<16} {:<16} {:>+10.4}%",
                symbol, candidate.native_b, candidate.first_spread
            );
        }

        Ok(())
    }
}
