//! Watcher lifecycle state.
//!
//! Provides [`WatcherState`] and [`WatcherHandle`] so that the CLI (and
//! tests) can observe what the background check loop is doing without
//! touching the loop itself.
//!
//! # Usage
//!
//! ```rust
//! use stockwatch_core::service::{WatcherHandle, WatcherState};
//!
//! let handle = WatcherHandle::new("widget");
//! assert_eq!(handle.state(), WatcherState::Stopped);
//!
//! handle.set_state(WatcherState::Starting);
//! handle.set_state(WatcherState::Watching);
//! assert!(handle.state().is_healthy());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;

// ============================================================================
// WatcherState
// ============================================================================

/// State of the watcher in its lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum WatcherState {
    /// Not running.
    Stopped,
    /// Building clients, waiting for the first tick.
    Starting,
    /// Last check succeeded.
    Watching,
    /// Last check failed; the loop keeps going.
    Degraded(String),
    /// Shutdown requested.
    Stopping,
    /// Could not start.
    Failed(String),
}

impl WatcherState {
    /// Returns `true` if the last check succeeded.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Watching)
    }

    /// Returns `true` if the check loop is alive (Watching or Degraded).
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Watching | Self::Degraded(_))
    }

    /// Returns `true` if the watcher is in a terminal state (Stopped or Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Watching => write!(f, "watching"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Stopping => write!(f, "stopping"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// WatcherHandle
// ============================================================================

/// Thread-safe handle for observing and updating watcher state.
///
/// Cheap to clone (Arc internals). State changes are broadcast
/// to all subscribers via a watch channel.
#[derive(Clone)]
pub struct WatcherHandle {
    inner: Arc<WatcherHandleInner>,
}

struct WatcherHandleInner {
    name: String,
    tx: watch::Sender<WatcherState>,
    started_at: Instant,
    checks: AtomicU64,
    failures: AtomicU64,
}

impl WatcherHandle {
    /// Create a new handle for the watcher of the named product.
    ///
    /// Initial state is [`WatcherState::Stopped`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(WatcherState::Stopped);
        Self {
            inner: Arc::new(WatcherHandleInner {
                name: name.into(),
                tx,
                started_at: Instant::now(),
                checks: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Get the watcher name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the current state.
    pub fn state(&self) -> WatcherState {
        self.inner.tx.borrow().clone()
    }

    /// Update the state. Unchanged states are not re-broadcast.
    pub fn set_state(&self, state: WatcherState) {
        let changed = self.inner.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
        if changed {
            log::info!("Watcher '{}' -> {state}", self.inner.name);
        }
    }

    /// Record the outcome of one check and move between Watching and Degraded.
    pub fn record_check(&self, result: Result<(), String>) {
        self.inner.checks.fetch_add(1, Ordering::Relaxed);
        match result {
            Ok(()) => self.set_state(WatcherState::Watching),
            Err(reason) => {
                self.inner.failures.fetch_add(1, Ordering::Relaxed);
                self.set_state(WatcherState::Degraded(reason));
            }
        }
    }

    /// Number of checks run so far.
    pub fn checks(&self) -> u64 {
        self.inner.checks.load(Ordering::Relaxed)
    }

    /// Number of checks that failed.
    pub fn failures(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<WatcherState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the first check has completed (Watching or Degraded), the
    /// watcher failed, or the timeout elapses.
    pub async fn wait_running(&self, timeout: Duration) -> Result<(), String> {
        let mut rx = self.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        {
            let state = rx.borrow_and_update().clone();
            match state {
                s if s.is_running() => return Ok(()),
                WatcherState::Failed(reason) => {
                    return Err(format!("Watcher '{}' failed: {reason}", self.inner.name));
                }
                _ => {}
            }
        }

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    return Err(format!(
                        "Watcher '{}' not running after {timeout:?} (state: {})",
                        self.inner.name, self.state()
                    ));
                }
                result = rx.changed() => {
                    if result.is_err() {
                        return Err(format!("Watcher '{}' channel closed", self.inner.name));
                    }
                    let state = rx.borrow().clone();
                    match state {
                        s if s.is_running() => return Ok(()),
                        WatcherState::Failed(reason) => {
                            return Err(format!(
                                "Watcher '{}' failed: {reason}",
                                self.inner.name
                            ));
                        }
                        _ => continue,
                    }
                }
            }
        }
    }

    /// Elapsed time since the handle was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("checks", &self.checks())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_state_display() {
        assert_eq!(WatcherState::Stopped.to_string(), "stopped");
        assert_eq!(WatcherState::Starting.to_string(), "starting");
        assert_eq!(WatcherState::Watching.to_string(), "watching");
        assert_eq!(
            WatcherState::Degraded("HTTP 503".to_string()).to_string(),
            "degraded: HTTP 503"
        );
        assert_eq!(WatcherState::Stopping.to_string(), "stopping");
        assert_eq!(
            WatcherState::Failed("bad selector".to_string()).to_string(),
            "failed: bad selector"
        );
    }

    #[test]
    fn test_watcher_state_predicates() {
        assert!(WatcherState::Watching.is_healthy());
        assert!(!WatcherState::Degraded("x".into()).is_healthy());

        assert!(WatcherState::Watching.is_running());
        assert!(WatcherState::Degraded("x".into()).is_running());
        assert!(!WatcherState::Starting.is_running());
        assert!(!WatcherState::Stopped.is_running());

        assert!(WatcherState::Stopped.is_terminal());
        assert!(WatcherState::Failed("x".into()).is_terminal());
        assert!(!WatcherState::Watching.is_terminal());
    }

    #[test]
    fn test_handle_initial_state() {
        let handle = WatcherHandle::new("widget");
        assert_eq!(handle.name(), "widget");
        assert_eq!(handle.state(), WatcherState::Stopped);
        assert_eq!(handle.checks(), 0);
    }

    #[test]
    fn test_record_check_transitions() {
        let handle = WatcherHandle::new("widget");
        handle.set_state(WatcherState::Starting);

        handle.record_check(Err("HTTP 503 from page".to_string()));
        assert_eq!(
            handle.state(),
            WatcherState::Degraded("HTTP 503 from page".to_string())
        );

        handle.record_check(Ok(()));
        assert_eq!(handle.state(), WatcherState::Watching);
        assert_eq!(handle.checks(), 2);
        assert_eq!(handle.failures(), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let handle1 = WatcherHandle::new("shared");
        let handle2 = handle1.clone();

        handle1.set_state(WatcherState::Watching);
        assert_eq!(handle2.state(), WatcherState::Watching);

        handle2.record_check(Ok(()));
        assert_eq!(handle1.checks(), 1);
    }

    #[test]
    fn test_uptime_is_shared_and_grows() {
        let handle = WatcherHandle::new("uptime");
        let clone = handle.clone();
        std::thread::sleep(Duration::from_millis(20));
        assert!(clone.uptime() >= Duration::from_millis(20));
        assert!(handle.uptime() >= Duration::from_millis(20));
    }

    #[test]
    fn test_unchanged_state_not_rebroadcast() {
        let handle = WatcherHandle::new("widget");
        let mut rx = handle.subscribe();
        rx.borrow_and_update();

        handle.set_state(WatcherState::Stopped);
        assert!(!rx.has_changed().unwrap());

        handle.set_state(WatcherState::Starting);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_wait_running_success() {
        let handle = WatcherHandle::new("widget");
        let h = handle.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.set_state(WatcherState::Starting);
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.record_check(Ok(()));
        });

        let result = handle.wait_running(Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_running_accepts_degraded() {
        let handle = WatcherHandle::new("widget");
        handle.record_check(Err("timeout".to_string()));

        let result = handle.wait_running(Duration::from_millis(50)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_running_timeout() {
        let handle = WatcherHandle::new("slow");
        handle.set_state(WatcherState::Starting);

        let result = handle.wait_running(Duration::from_millis(50)).await;
        assert!(result.unwrap_err().contains("not running after"));
    }

    #[tokio::test]
    async fn test_wait_running_failed() {
        let handle = WatcherHandle::new("broken");
        let h = handle.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.set_state(WatcherState::Failed("no webdriver".to_string()));
        });

        let err = handle
            .wait_running(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.contains("failed"));
        assert!(err.contains("no webdriver"));
    }

    #[test]
    fn test_handle_debug() {
        let handle = WatcherHandle::new("debug-test");
        let debug = format!("{:?}", handle);
        assert!(debug.contains("debug-test"));
        assert!(debug.contains("WatcherHandle"));
    }

    fn _assert_send_sync<T: Send + Sync>() {}
    #[test]
    fn test_handle_send_sync() {
        _assert_send_sync::<WatcherHandle>();
        _assert_send_sync::<WatcherState>();
    }
}
