//! In-memory notifier for tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use stockwatch_core::{Error, Result, StatusChange};

use crate::Notifier;

/// Records every change it is asked to deliver; optionally always fails.
#[derive(Debug)]
pub struct RecordingNotifier {
    name: String,
    fail: bool,
    attempts: AtomicUsize,
    received: Mutex<Vec<StatusChange>>,
}

impl RecordingNotifier {
    /// A notifier that accepts everything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail: false,
            attempts: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A notifier that rejects everything.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    /// Number of delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Changes delivered successfully.
    pub fn received(&self) -> Vec<StatusChange> {
        self.received
            .lock()
            .map(|changes| changes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, change: &StatusChange) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::notify(&self.name, "simulated failure"));
        }
        self.received
            .lock()
            .map_err(|_| Error::notify(&self.name, "lock poisoned"))?
            .push(change.clone());
        Ok(())
    }
}
