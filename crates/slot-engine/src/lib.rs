//! # slot-engine
//!
//! Deterministic appointment slot computation for booking pages.
//!
//! Given a provider's working hours, existing bookings, buffers, lead time and
//! slot granularity, the engine computes the non-overlapping, grid-aligned set
//! of start times that can be offered. Every function is pure: "now" is always
//! an argument, never a clock read.
//!
//! ## Modules
//!
//! - [`interval`]: Merge, expand and subtract time ranges
//! - [`slots`]: Free ranges → grid-aligned slots
//! - [`availability`]: Slots for one working window (`available_slots_for_window`)
//! - [`schedule`]: Weekly schedules, date overrides, legacy hours, daily caps
//! - [`dst`]: Local wall-clock time → UTC conversion policies
//! - [`conflict`]: Half-open overlap detection for booking validation
//! - [`error`]: Error types

pub mod availability;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod interval;
pub mod schedule;
pub mod slots;

pub use availability::{
    available_slots_for_window, AvailabilityOptions, SlotFormat, SlotOutput, MAX_OPTION_MINUTES,
};
pub use conflict::find_conflicts;
pub use dst::{local_time_to_utc, local_time_to_utc_exact, DstPolicy};
pub use error::SlotError;
pub use interval::{expand_intervals, merge_intervals, subtract_busy_from_working, TimeRange};
pub use schedule::{DailyLimit, DayPlan, Schedule, WallClock};
pub use slots::generate_slots_from_free;
