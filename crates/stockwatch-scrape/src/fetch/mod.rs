//! Page fetchers.
//!
//! [`PageFetcher`] is the seam between the watcher and however the product
//! page gets rendered: [`HttpFetcher`] for server-rendered pages,
//! [`WebDriverFetcher`] when the status is filled in by JavaScript.

mod http;
mod scripted;
mod webdriver;

pub use http::HttpFetcher;
pub use scripted::{ScriptedFetcher, ScriptedPage};
pub use webdriver::WebDriverFetcher;

use async_trait::async_trait;
use std::sync::Arc;
use stockwatch_core::Result;
use stockwatch_core::config::{FetchBackend, FetchConfig};

/// Fetches the HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Fetch `url` and return the page HTML.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Wait for cleanup left behind by fetches that were dropped mid-flight.
    async fn close(&self) {}
}

/// Build the fetcher selected by `config.backend`.
pub fn fetcher_from_config(config: &FetchConfig) -> Result<Arc<dyn PageFetcher>> {
    Ok(match config.backend {
        FetchBackend::Http => Arc::new(HttpFetcher::new(config)?),
        FetchBackend::Webdriver => Arc::new(WebDriverFetcher::new(config)?),
    })
}
