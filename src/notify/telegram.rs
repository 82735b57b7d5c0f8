//! Telegram Bot API notifier

use super::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Configuration for the Telegram notifier
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Base URL for the Bot API
    pub api_url: String,
    /// Bot token
    pub token: String,
    /// Chats that receive every message
    pub chat_ids: Vec<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: TELEGRAM_API_URL.to_string(),
            token: String::new(),
            chat_ids: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// sendMessage request body
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Sends messages to one or more Telegram chats
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            self.config.token
        )
    }

    fn body<'a>(chat_id: &'a str, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        }
    }

    async fn send_to(&self, url: &str, chat_id: &str, text: &str) {
        let result = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .json(&Self::body(chat_id, text))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(chat_id, "Telegram message sent");
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    chat_id,
                    status = status.as_u16(),
                    body = %body.chars().take(200).collect::<String>(),
                    "Telegram returned non-success status"
                );
            }
            Err(e) => {
                // reqwest errors carry the URL, which contains the bot token
                tracing::warn!(chat_id, error = %e.without_url(), "Failed to send Telegram message");
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        let url = self.send_url();
        for chat_id in &self.config.chat_ids {
            self.send_to(&url, chat_id, text).await;
        }
    }
}
