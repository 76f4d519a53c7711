#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # stockwatch-notify
//!
//! Outbound notifications for stock status changes:
//! - [`TelegramNotifier`]: Telegram Bot API `sendMessage`
//! - [`EmailNotifier`]: HTTP email relay (SendGrid v3 `mail/send`)
//! - [`NotifierSet`]: sends one change through every enabled channel

pub mod dispatch;
pub mod email;
pub mod message;
pub mod recording;
pub mod telegram;

use async_trait::async_trait;
use stockwatch_core::{Result, StatusChange};

pub use dispatch::{DispatchReport, NotifierSet};
pub use email::EmailNotifier;
pub use message::Message;
pub use recording::RecordingNotifier;
pub use telegram::TelegramNotifier;

/// A channel that can deliver a status change.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs and reports (`telegram`, `email`, ...).
    fn name(&self) -> &str;

    /// Deliver `change`.
    async fn notify(&self, change: &StatusChange) -> Result<()>;
}
