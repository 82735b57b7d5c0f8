//! Run command implementation

use super::Venues;
use crate::config::Config;
use crate::engine::{Engine, EngineSettings};
use crate::notify;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip the startup notification
    #[arg(long)]
    pub quiet_start: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let venues = Venues::from_config(config)?;
        let notifier = notify::from_config(&config.notify, venues.http.clone());

        let mut settings = EngineSettings::from_config(config);
        if self.quiet_start {
            settings.startup_message = false;
        }

        let mut engine = Engine::new(settings, venues.a, venues.b, notifier);
        engine.run().await
    }
}
