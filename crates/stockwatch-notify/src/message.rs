//! Rendering a status change into a human-readable message.

use chrono::SecondsFormat;
use stockwatch_core::StatusChange;

/// Subject line and plain-text body for one status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// One-line summary, e.g. `[IN STOCK] Widget: In stock`
    pub subject: String,
    /// Multi-line plain text body
    pub body: String,
}

impl Message {
    /// Render `change`.
    pub fn for_change(change: &StatusChange) -> Self {
        let subject = format!(
            "[{}] {}: {}",
            change.availability().label(),
            change.product,
            change.current
        );

        let previous = change
            .previous
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("(none)");

        let body = format!(
            "{} stock status changed.\n\nPrevious: {}\nCurrent:  {}\nChecked:  {}\n\n{}",
            change.product,
            previous,
            change.current,
            change.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            change.url,
        );

        Self { subject, body }
    }

    /// Subject and body joined, for channels without a subject field.
    pub fn to_text(&self) -> String {
        format!("{}\n\n{}", self.subject, self.body)
    }
}
