//! Core types for stockwatch.

mod change;
mod status;

pub use change::StatusChange;
pub use status::{Availability, Observation, StockStatus};
