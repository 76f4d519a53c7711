//! Fan-out of one status change to every configured channel.

use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::{Config, Error, Result, StatusChange};

use crate::{EmailNotifier, Notifier, TelegramNotifier};

/// Timeout for a single notification request.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Channels that accepted the message
    pub delivered: Vec<String>,
    /// Channels that failed, with the error
    pub failed: Vec<(String, Error)>,
}

impl DispatchReport {
    /// Returns `true` if every attempted channel delivered.
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of channels attempted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// The set of enabled notifiers.
#[derive(Clone, Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    /// Create a set from explicit notifiers.
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Build every channel enabled in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if config.telegram.enabled {
            notifiers.push(Arc::new(TelegramNotifier::new(
                &config.telegram,
                NOTIFY_TIMEOUT,
            )?));
        }
        if config.email.enabled {
            notifiers.push(Arc::new(EmailNotifier::new(&config.email, NOTIFY_TIMEOUT)?));
        }
        Ok(Self { notifiers })
    }

    /// Keep only the channel named `name`.
    pub fn only(mut self, name: &str) -> Self {
        self.notifiers.retain(|n| n.name() == name);
        self
    }

    /// Channel names, in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Returns `true` if no channel is configured.
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Send `change` through every channel.
    ///
    /// Channels are tried one after another; a failure is recorded and the
    /// next channel is still attempted.
    pub async fn dispatch(&self, change: &StatusChange) -> DispatchReport {
        let mut report = DispatchReport::default();

        for notifier in &self.notifiers {
            let channel = notifier.name().to_string();
            match notifier.notify(change).await {
                Ok(()) => {
                    tracing::info!(channel = %channel, "Notification delivered");
                    report.delivered.push(channel);
                }
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Notification failed");
                    report.failed.push((channel, e));
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for NotifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierSet")
            .field("channels", &self.names())
            .finish()
    }
}
