//! A detected change of stock status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{Availability, Observation, StockStatus};

/// Everything a notifier needs to describe a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Product display name
    pub product: String,

    /// Product page URL
    pub url: String,

    /// Last known status, `None` when this is the first observation
    pub previous: Option<StockStatus>,

    /// Newly observed status
    pub current: StockStatus,

    /// When the new status was scraped
    pub observed_at: DateTime<Utc>,
}

impl StatusChange {
    /// Builds a change from the previous status and a fresh observation.
    pub fn new(
        product: impl Into<String>,
        url: impl Into<String>,
        previous: Option<StockStatus>,
        observation: Observation,
    ) -> Self {
        Self {
            product: product.into(),
            url: url.into(),
            previous,
            current: observation.status,
            observed_at: observation.observed_at,
        }
    }

    /// Returns `true` when there was no earlier status to compare against.
    pub fn is_first_observation(&self) -> bool {
        self.previous.is_none()
    }

    /// Availability of the new status.
    pub fn availability(&self) -> Availability {
        self.current.availability()
    }
}
