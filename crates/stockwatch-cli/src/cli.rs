//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Watch a product page and get told when its stock status changes.
#[derive(Parser, Debug)]
#[command(name = "stockwatch", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "STOCKWATCH_CONFIG")]
    pub config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// The subcommand to run; `run` when none was given.
    pub fn effective_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll the product page until interrupted (default)
    Run,
    /// Fetch the page once and print the current status
    Check,
    /// Send a test notification through the configured channels
    TestNotify {
        /// Only this channel
        #[arg(long, value_enum)]
        channel: Option<Channel>,
    },
    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Where to write it (defaults to the standard location)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print one value by dotted key, e.g. `schedule.interval_secs`
    Get {
        /// Dotted key
        key: String,
    },
    /// Print the effective configuration with secrets masked
    Show,
}

/// Notification channels selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Telegram bot message
    Telegram,
    /// Email relay
    Email,
}

impl Channel {
    /// Notifier name for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Email => "email",
        }
    }
}
