//! Handlers for `run`, `check` and `test-notify`.

use std::future::Future;

use stockwatch_core::{Config, Error, Observation, Result, StatusChange, StockStatus};
use stockwatch_notify::{DispatchReport, NotifierSet};
use stockwatch_scrape::{Extractor, fetcher_from_config};

use crate::cli::Channel;
use crate::watcher::Watcher;

/// Status text used for test notifications.
pub const TEST_STATUS: &str = "Test notification";

/// Watch until `shutdown` resolves.
pub async fn cmd_run<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let watcher = Watcher::from_config(config)?;
    watcher.run(shutdown).await;
    Ok(())
}

/// Fetch once and return what was found. Needs no notification credentials.
pub async fn cmd_check(config: &Config) -> Result<Observation> {
    config.validate_scrape()?;
    let fetcher = fetcher_from_config(&config.fetch)?;
    let extractor = Extractor::from_selector_str(&config.product.selector)?;

    tracing::debug!(
        url = %config.product.url,
        fetcher = fetcher.name(),
        selector = %extractor.selector(),
        "Checking product page"
    );
    let page = fetcher.fetch(config.product.url.trim()).await?;
    let status = extractor.extract(&page)?;
    Ok(Observation::now(status))
}

/// Send a synthetic change through the configured channels.
///
/// Fails if no channel is selected or any channel rejects the message.
pub async fn cmd_test_notify(config: &Config, channel: Option<Channel>) -> Result<DispatchReport> {
    config.validate_channels()?;
    let mut notifiers = NotifierSet::from_config(config)?;
    if let Some(channel) = channel {
        notifiers = notifiers.only(channel.as_str());
    }
    if notifiers.is_empty() {
        return Err(Error::config(match channel {
            Some(channel) => format!("channel '{}' is not enabled", channel.as_str()),
            None => "no notification channel is enabled".to_string(),
        }));
    }

    let change = test_change(config)?;
    let report = notifiers.dispatch(&change).await;
    if let Some((channel, err)) = report.failed.first() {
        return Err(Error::notify(
            channel.clone(),
            format!("{} of {} channel(s) failed: {err}", report.failed.len(), report.attempted()),
        ));
    }
    Ok(report)
}

fn test_change(config: &Config) -> Result<StatusChange> {
    let current =
        StockStatus::parse(TEST_STATUS).ok_or_else(|| Error::config("empty test status"))?;
    Ok(StatusChange::new(
        config.product.name.clone(),
        config.product.url.trim().to_string(),
        None,
        Observation::now(current),
    ))
}
