//! The polling loop: fetch, extract, compare, notify.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::{
    Config, Observation, Result, StatusChange, StockStatus, WatcherHandle, WatcherState,
};
use stockwatch_notify::{DispatchReport, NotifierSet};
use stockwatch_scrape::{Extractor, PageFetcher, fetcher_from_config};
use tokio::time::MissedTickBehavior;

/// What one check found.
#[derive(Debug)]
pub enum CheckOutcome {
    /// First status seen; remembered without notifying.
    Baseline(StockStatus),
    /// Same status as last time.
    Unchanged(StockStatus),
    /// The status changed (or the first status, when configured to announce it).
    Changed {
        /// The change that was dispatched
        change: StatusChange,
        /// Per-channel delivery result
        report: DispatchReport,
    },
}

impl CheckOutcome {
    /// The status this check observed.
    pub fn status(&self) -> &StockStatus {
        match self {
            Self::Baseline(status) | Self::Unchanged(status) => status,
            Self::Changed { change, .. } => &change.current,
        }
    }
}

/// Product identity and polling behavior.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Display name used in messages
    pub product: String,
    /// Page to poll
    pub url: String,
    /// Time between checks
    pub interval: Duration,
    /// Notify on the very first observation instead of treating it as a baseline
    pub notify_on_first_check: bool,
}

impl WatchSettings {
    /// Settings from the `[product]` and `[schedule]` sections.
    pub fn from_config(config: &Config) -> Self {
        Self {
            product: config.product.name.clone(),
            url: config.product.url.trim().to_string(),
            interval: Duration::from_secs(config.schedule.interval_secs),
            notify_on_first_check: config.schedule.notify_on_first_check,
        }
    }
}

/// Watches one product page.
pub struct Watcher {
    settings: WatchSettings,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Extractor,
    notifiers: NotifierSet,
    last_status: Option<StockStatus>,
    handle: WatcherHandle,
}

impl Watcher {
    /// Assemble a watcher from its parts.
    pub fn new(
        settings: WatchSettings,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Extractor,
        notifiers: NotifierSet,
    ) -> Self {
        Self {
            settings,
            fetcher,
            extractor,
            notifiers,
            last_status: None,
            handle: WatcherHandle::new("watcher"),
        }
    }

    /// Build a watcher from a fully validated config.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let fetcher = fetcher_from_config(&config.fetch)?;
        let extractor = Extractor::from_selector_str(&config.product.selector)?;
        let notifiers = NotifierSet::from_config(config)?;
        Ok(Self::new(
            WatchSettings::from_config(config),
            fetcher,
            extractor,
            notifiers,
        ))
    }

    /// Lifecycle handle; clone it before calling [`run`](Self::run).
    pub fn handle(&self) -> WatcherHandle {
        self.handle.clone()
    }

    /// The status remembered from the last successful check.
    pub fn last_status(&self) -> Option<&StockStatus> {
        self.last_status.as_ref()
    }

    /// Fetch the page and extract the current status, without comparing.
    pub async fn observe(&self) -> Result<Observation> {
        let page = self.fetcher.fetch(&self.settings.url).await?;
        let status = self.extractor.extract(&page)?;
        Ok(Observation::now(status))
    }

    /// Run one check.
    ///
    /// On error nothing is remembered and nothing is sent. After a change
    /// the new status is remembered even if every channel failed.
    pub async fn check_once(&mut self) -> Result<CheckOutcome> {
        let observation = self.observe().await?;

        match &self.last_status {
            Some(last) if *last == observation.status => {
                return Ok(CheckOutcome::Unchanged(observation.status));
            }
            None if !self.settings.notify_on_first_check => {
                self.last_status = Some(observation.status.clone());
                return Ok(CheckOutcome::Baseline(observation.status));
            }
            _ => {}
        }

        let previous = self.last_status.replace(observation.status.clone());
        let change = StatusChange::new(
            self.settings.product.clone(),
            self.settings.url.clone(),
            previous,
            observation,
        );
        let report = self.notifiers.dispatch(&change).await;
        Ok(CheckOutcome::Changed { change, report })
    }

    /// Check immediately, then every interval, until `shutdown` resolves.
    ///
    /// Missed ticks are skipped rather than bunched up. A check in flight
    /// when `shutdown` fires is abandoned, and the fetcher's cleanup for it
    /// is awaited before the watcher reports `Stopped`.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.handle.set_state(WatcherState::Starting);
        tracing::info!(
            product = %self.settings.product,
            url = %self.settings.url,
            interval_secs = self.settings.interval.as_secs(),
            fetcher = self.fetcher.name(),
            selector = %self.extractor.selector(),
            channels = ?self.notifiers.names(),
            "Watcher starting"
        );

        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = &mut shutdown => None,
                result = self.check_once() => Some(result),
            };
            match result {
                Some(result) => self.record(result),
                None => break,
            }
        }

        self.handle.set_state(WatcherState::Stopping);
        tracing::info!(
            checks = self.handle.checks(),
            failures = self.handle.failures(),
            uptime_secs = self.handle.uptime().as_secs(),
            "Watcher stopping"
        );
        self.fetcher.close().await;
        self.handle.set_state(WatcherState::Stopped);
    }

    fn record(&self, result: Result<CheckOutcome>) {
        match result {
            Ok(outcome) => {
                self.handle.record_check(Ok(()));
                match outcome {
                    CheckOutcome::Baseline(status) => tracing::info!(
                        status = %status,
                        availability = %status.availability(),
                        "Baseline status recorded"
                    ),
                    CheckOutcome::Unchanged(status) => {
                        tracing::debug!(status = %status, "Status unchanged");
                    }
                    CheckOutcome::Changed { change, report } => {
                        let previous = change
                            .previous
                            .as_ref()
                            .map(|s| s.as_str())
                            .unwrap_or("(none)");
                        tracing::info!(
                            previous = %previous,
                            current = %change.current,
                            availability = %change.availability(),
                            delivered = report.delivered.len(),
                            failed = report.failed.len(),
                            "Stock status changed"
                        );
                    }
                }
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(error = %e, "Check failed; will retry next interval");
                } else {
                    tracing::error!(error = %e, "Check failed");
                }
                self.handle.record_check(Err(e.to_string()));
            }
        }
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("settings", &self.settings)
            .field("fetcher", &self.fetcher.name())
            .field("selector", &self.extractor.selector().as_str())
            .field("notifiers", &self.notifiers)
            .field("last_status", &self.last_status)
            .finish()
    }
}
