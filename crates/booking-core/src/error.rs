//! Error types for booking operations.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use slot_engine::schedule::{DaySource, WallClock};
use slot_engine::SlotError;
use thiserror::Error;
use uuid::Uuid;

/// Why a date offers no bookable time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    DayOff,
    ClosedByOverride,
    DailyLimitReached,
}

impl UnavailableReason {
    pub(crate) fn from_source(source: DaySource) -> Self {
        match source {
            DaySource::OverrideUnavailable => UnavailableReason::ClosedByOverride,
            _ => UnavailableReason::DayOff,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableReason::DayOff => "day off",
            UnavailableReason::ClosedByOverride => "closed by date override",
            UnavailableReason::DailyLimitReached => "daily booking limit reached",
        };
        f.write_str(text)
    }
}

/// Failures surfaced by [`crate::BookingService`] operations.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No availability on {date}: {reason}")]
    Unavailable {
        date: NaiveDate,
        reason: UnavailableReason,
    },

    #[error("{time} on {date} is outside working hours")]
    OutOfSchedule { date: NaiveDate, time: WallClock },

    /// `existing` is `None` when the store's uniqueness constraint caught a
    /// concurrent insert.
    #[error("Requested time overlaps an existing booking")]
    Conflict { existing: Option<Uuid> },

    #[error("{time} on {date} is not in the future")]
    PastTime { date: NaiveDate, time: WallClock },

    #[error("Booking {0} is already cancelled")]
    AlreadyTerminal(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Stable snake_case category name for callers mapping errors to
    /// responses.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Configuration(_) => "configuration",
            BookingError::NotFound { .. } => "not_found",
            BookingError::Unavailable { .. } => "unavailable",
            BookingError::OutOfSchedule { .. } => "out_of_schedule",
            BookingError::Conflict { .. } => "conflict",
            BookingError::PastTime { .. } => "past_time",
            BookingError::AlreadyTerminal(_) => "already_terminal",
            BookingError::Store(_) => "store",
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<SlotError> for BookingError {
    fn from(err: SlotError) -> Self {
        BookingError::Configuration(err.to_string())
    }
}

/// Failures reported by a [`crate::ports::BookingStore`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Another active booking already holds this staff member's start time.
    #[error("Duplicate booking for staff {staff_id} at {start}")]
    Duplicate {
        staff_id: String,
        start: DateTime<Utc>,
    },

    #[error("Booking {0} does not exist")]
    MissingRow(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Failures of calendar sync or notification delivery. Logged, never
/// propagated out of a booking operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SideEffectError {
    #[error("Calendar sync failed: {0}")]
    Calendar(String),

    #[error("Notification failed: {0}")]
    Notification(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
