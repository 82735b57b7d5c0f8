//! Notification module
//!
//! Delivers alert text to operators. Delivery is fire-and-forget:
//! failures are logged inside the notifier and never reach the caller.

mod alert;
mod telegram;

pub use alert::Alert;
pub use telegram::{TelegramConfig, TelegramNotifier};

use crate::config::NotifyConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for notification backends
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to every configured destination
    async fn notify(&self, text: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        tracing::info!(message = %text, "Notification");
    }
}

/// Build the notifier described by the configuration.
///
/// Telegram when a token and at least one chat are configured, else the log.
pub fn from_config(config: &NotifyConfig, client: reqwest::Client) -> Arc<dyn Notifier> {
    match config.resolved_token() {
        Some(token) if !config.telegram_chat_ids.is_empty() => {
            tracing::info!(
                chats = config.telegram_chat_ids.len(),
                "Telegram notifications enabled"
            );
            Arc::new(TelegramNotifier::new(
                client,
                TelegramConfig {
                    token,
                    chat_ids: config.telegram_chat_ids.clone(),
                    timeout: std::time::Duration::from_secs(config.timeout_secs),
                    ..Default::default()
                },
            ))
        }
        _ => {
            tracing::info!("No Telegram destination configured, alerts go to the log");
            Arc::new(LogNotifier)
        }
    }
}
