//! Common test utilities and harness for watcher integration tests.

use std::sync::Arc;
use std::time::Duration;

use stockwatch_cli::{WatchSettings, Watcher};
use stockwatch_core::Config;
use stockwatch_notify::{Notifier, NotifierSet, RecordingNotifier};
use stockwatch_scrape::{Extractor, ScriptedFetcher, ScriptedPage};

/// Product name used by every harness watcher.
pub const PRODUCT: &str = "Test Widget";

/// Product URL used by every harness watcher.
pub const URL: &str = "https://shop.example/widget";

/// Test harness for integration tests.
///
/// Wires a scripted fetcher and two recording channels into a watcher.
pub struct TestHarness {
    /// Scripted page source
    pub fetcher: Arc<ScriptedFetcher>,
    /// Recording stand-in for the messaging channel
    pub telegram: Arc<RecordingNotifier>,
    /// Recording stand-in for the email channel
    pub email: Arc<RecordingNotifier>,
}

impl TestHarness {
    /// Harness whose pages carry these statuses, in order.
    pub fn with_statuses(statuses: &[&str]) -> Self {
        Self::with_pages(statuses.iter().map(|s| ScriptedPage::with_status(s)).collect())
    }

    /// Harness with an explicit page script.
    pub fn with_pages(pages: Vec<ScriptedPage>) -> Self {
        Self {
            fetcher: Arc::new(ScriptedFetcher::new(pages)),
            telegram: Arc::new(RecordingNotifier::new("telegram")),
            email: Arc::new(RecordingNotifier::new("email")),
        }
    }

    /// Replace the email channel with one that always fails.
    pub fn with_failing_email(mut self) -> Self {
        self.email = Arc::new(RecordingNotifier::failing("email"));
        self
    }

    /// Build a watcher over the harness parts.
    pub fn watcher(&self, notify_on_first_check: bool) -> Watcher {
        Watcher::new(
            settings(notify_on_first_check),
            self.fetcher.clone(),
            Extractor::from_selector_str("#stock").unwrap(),
            NotifierSet::new(vec![
                self.telegram.clone() as Arc<dyn Notifier>,
                self.email.clone() as Arc<dyn Notifier>,
            ]),
        )
    }
}

/// Watch settings with a one-minute interval.
pub fn settings(notify_on_first_check: bool) -> WatchSettings {
    WatchSettings {
        product: PRODUCT.to_string(),
        url: URL.to_string(),
        interval: Duration::from_secs(60),
        notify_on_first_check,
    }
}

/// A config with every channel pointed at `api_base` and the product at `page_url`.
pub fn config_for(api_base: &str, page_url: &str) -> Config {
    let mut config = Config::default();
    config.product.name = PRODUCT.to_string();
    config.product.url = page_url.to_string();
    config.product.selector = "[itemprop=availability]".to_string();
    config.fetch.timeout_secs = 5;
    config.telegram.api_base = api_base.to_string();
    config.telegram.bot_token = "123:TOKEN".to_string();
    config.telegram.chat_id = "42".to_string();
    config.email.api_base = api_base.to_string();
    config.email.api_key = "SG.key".to_string();
    config.email.from = "bot@example.com".to_string();
    config.email.to = vec!["me@example.com".to_string()];
    config
}

/// Product page with a schema.org availability element.
pub fn product_page(status: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{PRODUCT}</title></head>
<body>
  <h1>{PRODUCT}</h1>
  <div class="price">$19.99</div>
  <p itemprop="availability">
    {status}
  </p>
</body>
</html>"#
    )
}
