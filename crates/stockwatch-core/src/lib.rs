#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Stockwatch Core Library
//!
//! Errors, domain types, configuration and lifecycle tracking shared by the
//! stockwatch scraper, notifiers and CLI.

pub mod config;
pub mod error;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use service::{WatcherHandle, WatcherState};
pub use types::{Availability, Observation, StatusChange, StockStatus};
