//! Slot generation -- turns free ranges into discrete, grid-aligned slots.
//!
//! Every slot is carved out of a single free range, so a slot can never
//! overlap the busy periods that range was computed against.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::interval::TimeRange;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Round `instant` up to the next multiple of `grid_minutes` since the epoch.
///
/// The rounding is a ceiling on the millisecond timestamp: an instant that is
/// already on the grid is returned unchanged. A missing or non-positive grid
/// leaves the instant untouched, as does a grid too large to express in
/// milliseconds.
pub fn align_up(instant: DateTime<Utc>, grid_minutes: Option<i64>) -> DateTime<Utc> {
    let grid_ms = match grid_minutes
        .filter(|g| *g > 0)
        .and_then(|g| g.checked_mul(MILLIS_PER_MINUTE))
    {
        Some(ms) => ms,
        None => return instant,
    };

    let ms = instant.timestamp_millis();
    let remainder = ms.rem_euclid(grid_ms);
    if remainder == 0 {
        return instant;
    }
    instant
        .checked_add_signed(Duration::milliseconds(grid_ms - remainder))
        .unwrap_or(instant)
}

/// Generate fixed-length slots from free ranges.
///
/// # Arguments
/// - `free` -- Disjoint free ranges, typically from [`crate::interval::subtract_busy_from_working`]
/// - `length` -- Length of each slot
/// - `step` -- Distance between consecutive slot starts within one free range
/// - `align_to_minutes` -- Optional grid the first slot of each range is rounded up to
///
/// `length` and `step` must be positive; callers validate them (see
/// [`crate::availability::AvailabilityOptions::validate`]).
pub fn generate_slots_from_free(
    free: &[TimeRange],
    length: Duration,
    step: Duration,
    align_to_minutes: Option<i64>,
) -> Vec<TimeRange> {
    let mut slots = Vec::new();
    if length <= Duration::zero() || step <= Duration::zero() {
        return slots;
    }

    for range in free {
        let mut candidate = align_up(range.start, align_to_minutes);
        while candidate + length <= range.end {
            slots.push(TimeRange {
                start: candidate,
                end: candidate + length,
            });
            candidate += step;
        }
    }

    slots
}

/// Render a slot as `"<startISO>|<endISO>"` with millisecond precision and a
/// trailing `Z`, e.g. `2024-01-01T09:00:00.000Z|2024-01-01T09:30:00.000Z`.
pub fn format_iso_pair(slot: &TimeRange) -> String {
    format!(
        "{}|{}",
        slot.start.to_rfc3339_opts(SecondsFormat::Millis, true),
        slot.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Render the slot start as `HH:MM` read off the reference axis.
pub fn format_wall_clock(slot: &TimeRange) -> String {
    slot.start.format("%H:%M").to_string()
}
