//! Error types for the stockwatch libraries.

/// Errors that can occur while watching a product page.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Page could not be fetched (connection refused, DNS, TLS, body decode).
    #[error("Fetch error: {message}")]
    Fetch {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote endpoint answered with a non-success status code.
    #[error("HTTP {status} from {context}")]
    Http {
        /// HTTP status code
        status: u16,
        /// What was being requested
        context: String,
    },

    /// WebDriver protocol error (session creation, navigation, page source).
    #[error("WebDriver error: {message}")]
    WebDriver {
        /// Error reported by the driver or by the client
        message: String,
    },

    /// The status element was not present on the page, or had no text.
    #[error("Stock status not found on page (selector `{selector}`)")]
    StatusNotFound {
        /// Selector that failed to match
        selector: String,
    },

    /// The status element selector could not be parsed.
    #[error("Invalid selector `{selector}`: {message}")]
    Selector {
        /// Selector as written in the configuration
        selector: String,
        /// What is wrong with it
        message: String,
    },

    /// A notification channel failed to deliver a message.
    #[error("Notification via {channel} failed: {message}")]
    Notify {
        /// Channel name (`telegram`, `email`, ...)
        channel: String,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error in a config file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Request timed out
    #[error("Timed out after {seconds}s")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },
}

/// Convenience `Result` type alias for stockwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is likely to clear up on the next check.
    ///
    /// Used to pick a log level; nothing is retried early because of it.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Fetch { .. } => true,
            Error::Http { status, .. } => *status >= 500 || *status == 429,
            Error::WebDriver { .. } => true,
            Error::Timeout { .. } => true,
            Error::Io(_) => true,
            Error::Notify { .. } => true,
            Error::StatusNotFound { .. } => false,
            Error::Selector { .. } => false,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
            Error::Toml(_) => false,
        }
    }

    /// Creates a new fetch error with a message.
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Error::Fetch {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new fetch error with a message and source error.
    pub fn fetch_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new HTTP status error.
    pub fn http<S: Into<String>>(status: u16, context: S) -> Self {
        Error::Http {
            status,
            context: context.into(),
        }
    }

    /// Creates a new WebDriver error.
    pub fn webdriver<S: Into<String>>(message: S) -> Self {
        Error::WebDriver {
            message: message.into(),
        }
    }

    /// Creates a status-not-found error for a selector.
    pub fn status_not_found<S: Into<String>>(selector: S) -> Self {
        Error::StatusNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a new selector parse error.
    pub fn selector<S, M>(selector: S, message: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Error::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates a new notification error for a channel.
    pub fn notify<C, M>(channel: C, message: M) -> Self
    where
        C: Into<String>,
        M: Into<String>,
    {
        Error::Notify {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
