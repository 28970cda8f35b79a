//! Bookable slots for one working window.
//!
//! Combines the interval algebra and the slot generator: existing bookings are
//! widened by their buffers, merged into a busy set, subtracted from the
//! working window, clipped to the earliest allowed start and finally cut into
//! grid-aligned slots.
//!
//! The computation is pure. "Now" never enters through a clock read; callers
//! pass it in as [`AvailabilityOptions::earliest_start`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::interval::{self, TimeRange};
use crate::slots;

/// Upper bound for every minute-valued option: one leap year.
pub const MAX_OPTION_MINUTES: i64 = 366 * 24 * 60;

/// Output representation for [`available_slots_for_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotFormat {
    /// Structured [`TimeRange`] values.
    #[default]
    Ranges,
    /// `"<startISO>|<endISO>"` strings.
    IsoPairs,
}

/// Knobs for a single availability computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOptions {
    /// Length of each slot. Must be positive.
    pub slot_length_minutes: i64,
    /// Distance between slot starts. Defaults to the slot length.
    #[serde(default)]
    pub slot_step_minutes: Option<i64>,
    #[serde(default)]
    pub buffer_before_minutes: i64,
    #[serde(default)]
    pub buffer_after_minutes: i64,
    /// Slots may not start before this instant.
    #[serde(default)]
    pub earliest_start: Option<DateTime<Utc>>,
    /// Grid the first slot of each free range is rounded up to.
    #[serde(default)]
    pub align_to_minutes: Option<i64>,
    #[serde(default)]
    pub format: SlotFormat,
}

impl AvailabilityOptions {
    /// Options with the given slot length and every other knob at its default.
    pub fn new(slot_length_minutes: i64) -> Self {
        Self {
            slot_length_minutes,
            slot_step_minutes: None,
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            earliest_start: None,
            align_to_minutes: None,
            format: SlotFormat::Ranges,
        }
    }

    pub fn with_step(mut self, minutes: i64) -> Self {
        self.slot_step_minutes = Some(minutes);
        self
    }

    pub fn with_buffers(mut self, before_minutes: i64, after_minutes: i64) -> Self {
        self.buffer_before_minutes = before_minutes;
        self.buffer_after_minutes = after_minutes;
        self
    }

    pub fn with_earliest_start(mut self, earliest: DateTime<Utc>) -> Self {
        self.earliest_start = Some(earliest);
        self
    }

    pub fn with_alignment(mut self, grid_minutes: i64) -> Self {
        self.align_to_minutes = Some(grid_minutes);
        self
    }

    pub fn with_format(mut self, format: SlotFormat) -> Self {
        self.format = format;
        self
    }

    /// The effective step, falling back to the slot length.
    pub fn step_minutes(&self) -> i64 {
        self.slot_step_minutes.unwrap_or(self.slot_length_minutes)
    }

    /// Reject non-positive lengths and steps, negative buffers, and any
    /// minute value above [`MAX_OPTION_MINUTES`].
    pub fn validate(&self) -> Result<()> {
        if self.slot_length_minutes <= 0 {
            return Err(SlotError::Configuration(format!(
                "slot length must be positive, got {} minutes",
                self.slot_length_minutes
            )));
        }
        if self.step_minutes() <= 0 {
            return Err(SlotError::Configuration(format!(
                "slot step must be positive, got {} minutes",
                self.step_minutes()
            )));
        }
        if self.buffer_before_minutes < 0 || self.buffer_after_minutes < 0 {
            return Err(SlotError::Configuration(format!(
                "buffers must not be negative, got {}/{} minutes",
                self.buffer_before_minutes, self.buffer_after_minutes
            )));
        }
        let bounded = [
            ("slot length", Some(self.slot_length_minutes)),
            ("slot step", self.slot_step_minutes),
            ("buffer before", Some(self.buffer_before_minutes)),
            ("buffer after", Some(self.buffer_after_minutes)),
            ("alignment grid", self.align_to_minutes),
        ];
        for (name, value) in bounded {
            if let Some(minutes) = value.filter(|m| *m > MAX_OPTION_MINUTES) {
                return Err(SlotError::Configuration(format!(
                    "{name} must be at most {MAX_OPTION_MINUTES} minutes, got {minutes}"
                )));
            }
        }
        Ok(())
    }
}

/// Result of [`available_slots_for_window`], shaped by [`SlotFormat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotOutput {
    Ranges(Vec<TimeRange>),
    IsoPairs(Vec<String>),
}

impl SlotOutput {
    pub fn len(&self) -> usize {
        match self {
            SlotOutput::Ranges(r) => r.len(),
            SlotOutput::IsoPairs(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The structured ranges, or `None` when ISO strings were requested.
    pub fn into_ranges(self) -> Option<Vec<TimeRange>> {
        match self {
            SlotOutput::Ranges(r) => Some(r),
            SlotOutput::IsoPairs(_) => None,
        }
    }
}

/// Compute the bookable slots inside one working window.
///
/// `bookings` need not be pre-filtered to the window; anything that cannot
/// reach the window even after buffering is discarded, as are bookings with
/// `start >= end`. A zero-length or inverted window yields no slots.
///
/// # Errors
/// Returns `SlotError::Configuration` when the options fail
/// [`AvailabilityOptions::validate`].
pub fn available_slots_for_window(
    working_start: DateTime<Utc>,
    working_end: DateTime<Utc>,
    bookings: &[TimeRange],
    options: &AvailabilityOptions,
) -> Result<SlotOutput> {
    options.validate()?;

    let slots = compute_slots(working_start, working_end, bookings, options);

    debug!(
        window_start = %working_start,
        window_end = %working_end,
        bookings = bookings.len(),
        slots = slots.len(),
        "computed slots for working window"
    );

    Ok(match options.format {
        SlotFormat::Ranges => SlotOutput::Ranges(slots),
        SlotFormat::IsoPairs => {
            SlotOutput::IsoPairs(slots.iter().map(slots::format_iso_pair).collect())
        }
    })
}

/// The free ranges of a window after buffering, merging and lead-time
/// clipping; the input to the slot generator. Options must already be valid.
pub fn free_ranges_for_window(
    working_start: DateTime<Utc>,
    working_end: DateTime<Utc>,
    bookings: &[TimeRange],
    options: &AvailabilityOptions,
) -> Vec<TimeRange> {
    if working_start >= working_end {
        return Vec::new();
    }
    let working = TimeRange {
        start: working_start,
        end: working_end,
    };

    let before = Duration::minutes(options.buffer_before_minutes);
    let after = Duration::minutes(options.buffer_after_minutes);

    // A booking is relevant when its buffered span reaches into the window.
    let relevant: Vec<TimeRange> = bookings
        .iter()
        .filter(|b| b.is_valid())
        .filter(|b| b.start - before < working.end && b.end + after > working.start)
        .copied()
        .collect();

    let busy = interval::merge_intervals(&interval::expand_intervals(&relevant, before, after));
    let free = interval::subtract_busy_from_working(&working, &busy);

    match options.earliest_start {
        Some(earliest) => clip_to_earliest(free, earliest),
        None => free,
    }
}

fn compute_slots(
    working_start: DateTime<Utc>,
    working_end: DateTime<Utc>,
    bookings: &[TimeRange],
    options: &AvailabilityOptions,
) -> Vec<TimeRange> {
    let free = free_ranges_for_window(working_start, working_end, bookings, options);
    slots::generate_slots_from_free(
        &free,
        Duration::minutes(options.slot_length_minutes),
        Duration::minutes(options.step_minutes()),
        options.align_to_minutes,
    )
}

/// Drop free ranges ending at or before `earliest` and truncate the one that
/// straddles it.
fn clip_to_earliest(free: Vec<TimeRange>, earliest: DateTime<Utc>) -> Vec<TimeRange> {
    free.into_iter()
        .filter(|r| r.end > earliest)
        .map(|r| TimeRange {
            start: r.start.max(earliest),
            end: r.end,
        })
        .collect()
}
