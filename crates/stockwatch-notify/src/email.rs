//! Email relay notifier (SendGrid v3 `mail/send` wire format).

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use stockwatch_core::config::EmailConfig;
use stockwatch_core::{Error, Result, StatusChange};

use crate::Notifier;
use crate::message::Message;

const CHANNEL: &str = "email";

/// Longest relay error body quoted back in an error.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

/// Sends status changes by email through an HTTP relay.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    to: Vec<String>,
}

impl EmailNotifier {
    /// Create a notifier from the `[email]` config section.
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self> {
        let to: Vec<String> = config
            .to
            .iter()
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect();
        if config.api_key.trim().is_empty() || config.from.trim().is_empty() || to.is_empty() {
            return Err(Error::config("email needs api_key, from and at least one recipient"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::notify(CHANNEL, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v3/mail/send", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.trim().to_string(),
            from: config.from.trim().to_string(),
            to,
        })
    }

    /// Send a plain-text email to every configured recipient.
    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let payload = MailSend {
            personalizations: vec![Personalization {
                to: self.to.iter().map(|email| Address { email }).collect(),
            }],
            from: Address { email: &self.from },
            subject,
            content: vec![Content {
                kind: "text/plain",
                value: body,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notify(CHANNEL, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        let detail: String = detail.trim().chars().take(MAX_ERROR_BODY).collect();
        Err(Error::notify(
            CHANNEL,
            if detail.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {detail}", status.as_u16())
            },
        ))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    async fn notify(&self, change: &StatusChange) -> Result<()> {
        let message = Message::for_change(change);
        self.send(&message.subject, &message.body).await?;
        tracing::debug!(recipients = self.to.len(), "Email sent");
        Ok(())
    }
}
