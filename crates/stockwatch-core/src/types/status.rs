//! Observed stock status and its availability classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Phrases that mean the product cannot be bought right now.
///
/// Checked before [`IN_STOCK_PHRASES`] since "unavailable" contains "available".
const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "out of stock",
    "out-of-stock",
    "outofstock",
    "sold out",
    "soldout",
    "not in stock",
    "no longer in stock",
    "when back in stock",
    "unavailable",
    "not available",
    "no longer available",
    "no stock",
    "notify me",
    "email me when",
    "discontinued",
];

const IN_STOCK_PHRASES: &[&str] = &[
    "in stock",
    "in-stock",
    "instock",
    "limitedavailability",
    "onlineonly",
    "instoreonly",
    "preorder",
    "pre-order",
    "backorder",
    "available",
    "add to cart",
    "add to basket",
    "buy now",
    "ships",
];

/// Coarse availability derived from a status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The product can be ordered.
    InStock,
    /// The product cannot be ordered.
    OutOfStock,
    /// The status text did not contain a recognized phrase.
    Unknown,
}

impl Availability {
    /// Classifies free-form status text (or a schema.org availability URL).
    pub fn classify(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if OUT_OF_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
            Availability::OutOfStock
        } else if IN_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
            Availability::InStock
        } else {
            Availability::Unknown
        }
    }

    /// Short uppercase label for message subjects.
    pub fn label(&self) -> &'static str {
        match self {
            Availability::InStock => "IN STOCK",
            Availability::OutOfStock => "OUT OF STOCK",
            Availability::Unknown => "STOCK CHANGE",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::InStock => write!(f, "in stock"),
            Availability::OutOfStock => write!(f, "out of stock"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Normalized stock status text as scraped from the product page.
///
/// Whitespace runs are collapsed and the text is trimmed; the value is never
/// empty. Comparison ignores ASCII case so that a page toggling between
/// "In Stock" and "IN STOCK" is not reported as a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockStatus(String);

impl StockStatus {
    /// Normalizes `text` into a status, or `None` if nothing but whitespace remains.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// Returns the normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies this status.
    pub fn availability(&self) -> Availability {
        Availability::classify(&self.0)
    }
}

impl PartialEq for StockStatus {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for StockStatus {}

impl Hash for StockStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A status together with the time it was scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Observed status
    pub status: StockStatus,
    /// When the page was scraped
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Records `status` as observed now.
    pub fn now(status: StockStatus) -> Self {
        Self {
            status,
            observed_at: Utc::now(),
        }
    }
}
