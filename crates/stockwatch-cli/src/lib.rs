//! # stockwatch-cli
//!
//! The `stockwatch` command: polls one product page on a timer and sends a
//! Telegram message and an email whenever the stock status changes.
//!
//! - [`watcher`]: the check loop and change detection
//! - [`commands`]: `run`, `check`, `test-notify`
//! - [`config_handlers`]: `config path|init|get|show`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod logging;
pub mod watcher;

pub use cli::{Args, Channel, Command, ConfigAction};
pub use watcher::{CheckOutcome, WatchSettings, Watcher};
