#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # stockwatch-scrape
//!
//! Fetching the product page and pulling the stock status out of it:
//! - [`fetch`]: HTTP and headless-browser (WebDriver) page fetchers
//! - [`selector`]: the status element locator
//! - [`extract`]: element lookup and text extraction
//! - [`html`]: the tag scanner underneath

pub mod extract;
pub mod fetch;
pub mod html;
pub mod selector;

pub use extract::{Extractor, extract_status};
pub use fetch::{PageFetcher, ScriptedFetcher, ScriptedPage, fetcher_from_config};
pub use selector::Selector;
