//! Telegram Bot API notifier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stockwatch_core::config::TelegramConfig;
use stockwatch_core::{Error, Result, StatusChange};

use crate::Notifier;
use crate::message::Message;

const CHANNEL: &str = "telegram";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends status changes to a Telegram chat through a bot.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier from the `[telegram]` config section.
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        if config.bot_token.trim().is_empty() || config.chat_id.trim().is_empty() {
            return Err(Error::config("telegram needs bot_token and chat_id"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::notify(CHANNEL, format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            chat_id: config.chat_id.trim().to_string(),
        })
    }

    /// Send raw text to the configured chat.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: false,
        };

        // Request errors carry the URL, which embeds the bot token.
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::notify(CHANNEL, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::notify(CHANNEL, e.without_url().to_string()))?;

        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(Error::notify(
                CHANNEL,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    description.unwrap_or_else(|| "request rejected".to_string())
                ),
            )),
            None => Err(Error::notify(
                CHANNEL,
                format!("HTTP {}: unexpected response", status.as_u16()),
            )),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    async fn notify(&self, change: &StatusChange) -> Result<()> {
        let message = Message::for_change(change);
        self.send_text(&message.to_text()).await?;
        tracing::debug!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(())
    }
}
