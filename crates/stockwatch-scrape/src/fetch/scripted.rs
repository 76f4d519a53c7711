//! Scripted fetcher for tests and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use stockwatch_core::{Error, Result};

use super::PageFetcher;

/// One scripted fetch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedPage {
    /// Return this HTML.
    Html(String),
    /// Fail with a fetch error carrying this message.
    Fail(String),
}

impl ScriptedPage {
    /// Page whose `<span id="stock">` holds `status`.
    pub fn with_status(status: &str) -> Self {
        ScriptedPage::Html(format!(
            "<html><body><span id=\"stock\">{status}</span></body></html>"
        ))
    }
}

/// Returns scripted pages in order; the last one repeats once the script runs out.
#[derive(Debug)]
pub struct ScriptedFetcher {
    pages: Mutex<VecDeque<ScriptedPage>>,
    last: Mutex<Option<ScriptedPage>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    /// Create a fetcher that plays `pages` in order.
    pub fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a fetcher that always returns the page built by [`ScriptedPage::with_status`].
    pub fn with_status(status: &str) -> Self {
        Self::new(vec![ScriptedPage::with_status(status)])
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = {
            let mut pages = self
                .pages
                .lock()
                .map_err(|_| Error::fetch("scripted fetcher lock poisoned"))?;
            pages.pop_front()
        };
        let mut last = self
            .last
            .lock()
            .map_err(|_| Error::fetch("scripted fetcher lock poisoned"))?;
        if let Some(page) = next {
            *last = Some(page);
        }

        match last.as_ref() {
            Some(ScriptedPage::Html(html)) => Ok(html.clone()),
            Some(ScriptedPage::Fail(message)) => Err(Error::fetch(message.clone())),
            None => Err(Error::fetch("scripted fetcher has no pages")),
        }
    }
}
