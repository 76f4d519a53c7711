//! Configuration for the watcher.
//!
//! Loaded from a TOML file (see [`Config::resolve_config_path`]) with
//! secrets optionally supplied through environment variables. A missing file
//! is not an error: every field has a default, and [`Config::validate`]
//! reports what still needs to be filled in.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project name, used for the config directory.
pub const PROJECT_NAME: &str = "stockwatch";

/// Environment variable overriding `product.url`.
pub const ENV_PRODUCT_URL: &str = "STOCKWATCH_PRODUCT_URL";
/// Environment variable overriding `telegram.bot_token`.
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "STOCKWATCH_TELEGRAM_BOT_TOKEN";
/// Environment variable overriding `telegram.chat_id`.
pub const ENV_TELEGRAM_CHAT_ID: &str = "STOCKWATCH_TELEGRAM_CHAT_ID";
/// Environment variable overriding `email.api_key`.
pub const ENV_EMAIL_API_KEY: &str = "STOCKWATCH_EMAIL_API_KEY";
/// Environment variable overriding `fetch.webdriver_url`; also selects the WebDriver backend.
pub const ENV_WEBDRIVER_URL: &str = "STOCKWATCH_WEBDRIVER_URL";

const REDACTED: &str = "***";

/// Upper bound for `fetch.timeout_secs`.
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 3600;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The watched product
    pub product: ProductConfig,
    /// Check timing
    pub schedule: ScheduleConfig,
    /// How the page is fetched
    pub fetch: FetchConfig,
    /// Telegram channel
    pub telegram: TelegramConfig,
    /// Email relay channel
    pub email: EmailConfig,
}

/// The single product page being watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Display name used in notifications
    pub name: String,
    /// Product page URL
    pub url: String,
    /// Locator of the element holding the stock status text
    pub selector: String,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: "Product".to_string(),
            url: String::new(),
            selector: "[itemprop=availability]".to_string(),
        }
    }
}

/// Check timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between checks
    pub interval_secs: u64,
    /// Send a notification for the very first observation after start
    pub notify_on_first_check: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            notify_on_first_check: false,
        }
    }
}

/// Page fetch backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// Plain HTTP GET; no JavaScript.
    #[default]
    Http,
    /// Headless browser driven through a WebDriver endpoint.
    Webdriver,
}

impl std::fmt::Display for FetchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchBackend::Http => write!(f, "http"),
            FetchBackend::Webdriver => write!(f, "webdriver"),
        }
    }
}

/// How the product page is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Backend used for every fetch
    pub backend: FetchBackend,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// User-Agent header for plain HTTP fetches
    pub user_agent: String,
    /// WebDriver endpoint, e.g. `http://localhost:9515`
    pub webdriver_url: Option<String>,
    /// Time given to the page's scripts after navigation, in milliseconds
    pub render_wait_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Http,
            timeout_secs: 30,
            user_agent: format!(
                "Mozilla/5.0 (compatible; {PROJECT_NAME}/{})",
                env!("CARGO_PKG_VERSION")
            ),
            webdriver_url: None,
            render_wait_ms: 2000,
        }
    }
}

/// Telegram Bot API channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Send notifications through Telegram
    pub enabled: bool,
    /// Bot API base URL
    pub api_base: String,
    /// Bot token from BotFather
    pub bot_token: String,
    /// Target chat (numeric id or `@channel`)
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// Email relay channel (SendGrid v3 mail send).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Send notifications by email
    pub enabled: bool,
    /// Relay API base URL
    pub api_base: String,
    /// Relay API key
    pub api_key: String,
    /// Sender address
    pub from: String,
    /// Recipient addresses
    pub to: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.sendgrid.com".to_string(),
            api_key: String::new(),
            from: String::new(),
            to: Vec::new(),
        }
    }
}

impl Config {
    /// Default config file location: `{config_dir}/stockwatch/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, otherwise the default location.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_config_path(),
        }
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Overlay values from the environment. Empty values are ignored.
    ///
    /// Takes a lookup function so callers (and tests) control the source.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_PRODUCT_URL) {
            self.product.url = url;
        }
        if let Some(token) = get(ENV_TELEGRAM_BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat) = get(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = chat;
        }
        if let Some(key) = get(ENV_EMAIL_API_KEY) {
            self.email.api_key = key;
        }
        if let Some(url) = get(ENV_WEBDRIVER_URL) {
            self.fetch.webdriver_url = Some(url);
            self.fetch.backend = FetchBackend::Webdriver;
        }
    }

    /// Check everything needed to scrape the product page.
    pub fn validate_scrape(&self) -> Result<()> {
        let url = self.product.url.trim();
        if url.is_empty() {
            return Err(Error::config(format!(
                "product.url is not set (set it in the config file or {ENV_PRODUCT_URL})"
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "product.url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.product.selector.trim().is_empty() {
            return Err(Error::config("product.selector must not be empty"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(Error::config("schedule.interval_secs must be at least 1"));
        }
        if !(1..=MAX_FETCH_TIMEOUT_SECS).contains(&self.fetch.timeout_secs) {
            return Err(Error::config(format!(
                "fetch.timeout_secs must be between 1 and {MAX_FETCH_TIMEOUT_SECS}, got {}",
                self.fetch.timeout_secs
            )));
        }
        if self.fetch.backend == FetchBackend::Webdriver
            && self
                .fetch
                .webdriver_url
                .as_deref()
                .is_none_or(|u| u.trim().is_empty())
        {
            return Err(Error::config(format!(
                "fetch.backend = \"webdriver\" requires fetch.webdriver_url (or {ENV_WEBDRIVER_URL})"
            )));
        }
        Ok(())
    }

    /// Check everything needed to send notifications.
    pub fn validate_channels(&self) -> Result<()> {
        if self.telegram.enabled {
            if self.telegram.bot_token.trim().is_empty() {
                return Err(Error::config(format!(
                    "telegram.bot_token is not set (or set {ENV_TELEGRAM_BOT_TOKEN}, or telegram.enabled = false)"
                )));
            }
            if self.telegram.chat_id.trim().is_empty() {
                return Err(Error::config(format!(
                    "telegram.chat_id is not set (or set {ENV_TELEGRAM_CHAT_ID})"
                )));
            }
        }
        if self.email.enabled {
            if self.email.api_key.trim().is_empty() {
                return Err(Error::config(format!(
                    "email.api_key is not set (or set {ENV_EMAIL_API_KEY}, or email.enabled = false)"
                )));
            }
            if self.email.from.trim().is_empty() {
                return Err(Error::config("email.from is not set"));
            }
            if self.email.to.iter().all(|to| to.trim().is_empty()) {
                return Err(Error::config("email.to needs at least one recipient"));
            }
        }
        Ok(())
    }

    /// Full validation for the `run` command.
    pub fn validate(&self) -> Result<()> {
        self.validate_scrape()?;
        self.validate_channels()
    }

    /// Copy of this config with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.telegram.bot_token.is_empty() {
            copy.telegram.bot_token = REDACTED.to_string();
        }
        if !copy.email.api_key.is_empty() {
            copy.email.api_key = REDACTED.to_string();
        }
        copy
    }
}
