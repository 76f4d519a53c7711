//! Headless browser fetcher over the W3C WebDriver protocol.
//!
//! Talks to a running driver (chromedriver, geckodriver, Selenium) with
//! plain JSON over HTTP:
//!
//! 1. `POST /session` with headless browser capabilities
//! 2. `POST /session/{id}/url` to navigate
//! 3. wait `render_wait_ms` for client-side rendering
//! 4. `GET /session/{id}/source` for the rendered HTML
//! 5. `DELETE /session/{id}`, whether or not 2-4 succeeded
//!
//! If the fetch future is dropped between 1 and 5 the session is deleted
//! by a background task; [`PageFetcher::close`] waits for those.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinSet;
use stockwatch_core::config::FetchConfig;
use stockwatch_core::{Error, Result};

use super::PageFetcher;

/// Slack on top of the page-load timeout for the HTTP round trip to the driver.
const DRIVER_SLACK: Duration = Duration::from_secs(10);

/// Fetches rendered pages through a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverFetcher {
    client: reqwest::Client,
    base_url: String,
    render_wait: Duration,
    page_load_timeout: Duration,
    abandoned: Arc<Mutex<JoinSet<()>>>,
}

impl WebDriverFetcher {
    /// Create a fetcher for `config.webdriver_url`.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base_url = config
            .webdriver_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::config("fetch.webdriver_url is required for the webdriver backend"))?
            .trim_end_matches('/')
            .to_string();

        let page_load_timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(page_load_timeout.saturating_add(DRIVER_SLACK))
            .build()
            .map_err(|e| Error::fetch_with_source("failed to build WebDriver client", e))?;

        Ok(Self {
            client,
            base_url,
            render_wait: Duration::from_millis(config.render_wait_ms),
            page_load_timeout,
            abandoned: Arc::default(),
        })
    }

    fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "normal",
                    "timeouts": {
                        "pageLoad": u64::try_from(self.page_load_timeout.as_millis()).unwrap_or(u64::MAX),
                    },
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--disable-gpu",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--window-size=1280,800",
                        ],
                    },
                },
            },
        })
    }

    async fn new_session(&self) -> Result<String> {
        let body = command(
            self.client
                .post(format!("{}/session", self.base_url))
                .json(&self.capabilities()),
            "new session",
        )
        .await?;

        body["value"]["sessionId"]
            .as_str()
            .or_else(|| body["sessionId"].as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::webdriver("new session: response has no sessionId"))
    }

    async fn load(&self, session: &str, url: &str) -> Result<String> {
        command(
            self.client
                .post(format!("{}/session/{session}/url", self.base_url))
                .json(&json!({ "url": url })),
            "navigate",
        )
        .await?;

        if !self.render_wait.is_zero() {
            tokio::time::sleep(self.render_wait).await;
        }

        let body = command(
            self.client
                .get(format!("{}/session/{session}/source", self.base_url)),
            "page source",
        )
        .await?;

        body["value"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::webdriver("page source: value is not a string"))
    }

    fn delete_request(&self, session: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(format!("{}/session/{session}", self.base_url))
    }

    async fn delete_session(&self, session: &str) -> Result<()> {
        command(self.delete_request(session), "delete session")
            .await
            .map(|_| ())
    }

    /// Delete `session` on a background task tracked in `abandoned`.
    fn delete_in_background(&self, session: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(session = %session, "No runtime left to delete abandoned WebDriver session");
            return;
        };
        let request = self.delete_request(&session);
        self.abandoned_tasks().spawn_on(
            async move {
                match command(request, "delete session").await {
                    Ok(_) => tracing::debug!(session = %session, "Deleted abandoned WebDriver session"),
                    Err(e) => tracing::warn!(
                        session = %session,
                        error = %e,
                        "Failed to delete abandoned WebDriver session"
                    ),
                }
            },
            &runtime,
        );
    }

    fn abandoned_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.abandoned
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Send a WebDriver command and return the response body.
async fn command(request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::webdriver(format!("{what}: {e}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::webdriver(format!("{what}: unreadable response: {e}")))?;

    if !status.is_success() {
        let error = body["value"]["error"].as_str().unwrap_or("unknown error");
        let message = body["value"]["message"].as_str().unwrap_or_default();
        return Err(Error::webdriver(format!(
            "{what}: {error} (HTTP {}){}{message}",
            status.as_u16(),
            if message.is_empty() { "" } else { ": " },
        )));
    }
    Ok(body)
}

/// Deletes the session in the background unless disarmed first.
struct SessionGuard<'a> {
    fetcher: &'a WebDriverFetcher,
    session: Option<String>,
}

impl SessionGuard<'_> {
    fn disarm(&mut self) {
        self.session = None;
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(session = %session, "WebDriver fetch abandoned mid-session");
            self.fetcher.delete_in_background(session);
        }
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let session = self.new_session().await?;
        tracing::debug!(session = %session, url = %url, "WebDriver session created");
        let mut guard = SessionGuard {
            fetcher: self,
            session: Some(session.clone()),
        };

        let result = self.load(&session, url).await;

        if let Err(e) = self.delete_session(&session).await {
            tracing::warn!(session = %session, error = %e, "Failed to delete WebDriver session");
        }
        guard.disarm();

        if let Ok(html) = &result {
            tracing::debug!(url = %url, bytes = html.len(), "Fetched rendered page");
        }
        result
    }

    async fn close(&self) {
        let mut pending = std::mem::take(&mut *self.abandoned_tasks());
        while pending.join_next().await.is_some() {}
    }
}
