//! Plain HTTP fetcher.

use async_trait::async_trait;
use std::time::Duration;
use stockwatch_core::config::FetchConfig;
use stockwatch_core::{Error, Result};

use super::PageFetcher;

/// Fetches pages with a single GET request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Create a fetcher using the configured user agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::fetch_with_source("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!(url = %url, "GET product page");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| request_error(e, url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(status.as_u16(), url));
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, url, self.timeout_secs))?;

        tracing::debug!(url = %url, bytes = body.len(), "Fetched product page");
        Ok(body)
    }
}

fn request_error(e: reqwest::Error, url: &str, timeout_secs: u64) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            seconds: timeout_secs,
        }
    } else {
        Error::fetch_with_source(format!("GET {url} failed"), e)
    }
}
