//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// Engine input that cannot be computed with (non-positive slot length,
    /// inverted range, negative buffer). Never silently coerced.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// A wall-clock string that is not `HH:MM` in the 00:00–24:00 range.
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
