//! Interval algebra over absolute time ranges.
//!
//! Merges overlapping busy periods, widens bookings by their buffers, and
//! subtracts a sorted busy set from a working window to obtain the free gaps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// A span of time `[start, end)` on the shared UTC axis.
///
/// Valid ranges satisfy `start < end`. Use [`TimeRange::new`] when the input
/// comes from outside the engine; the public fields exist for cheap literal
/// construction in already-validated code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(SlotError::Configuration(format!(
                "range start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open overlap test. Ranges that only touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The overlapping part of two ranges, if any.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeRange { start, end })
    }
}

/// Merge ranges into a disjoint, time-ordered list.
///
/// Touching ranges (`next.start == current.end`) are merged as well, so the
/// result never contains two ranges that share a boundary.
pub fn merge_intervals(ranges: &[TimeRange]) -> Vec<TimeRange> {
    if ranges.is_empty() {
        return Vec::new();
    }

    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        if let Some(last) = merged.last_mut() {
            if range.start <= last.end {
                last.end = last.end.max(range.end);
                continue;
            }
        }
        merged.push(range);
    }

    merged
}

/// Widen every range by `before` at the start and `after` at the end.
///
/// No merging happens here; run [`merge_intervals`] afterwards when the
/// widened ranges may overlap.
pub fn expand_intervals(ranges: &[TimeRange], before: Duration, after: Duration) -> Vec<TimeRange> {
    ranges
        .iter()
        .map(|r| TimeRange {
            start: r.start - before,
            end: r.end + after,
        })
        .collect()
}

/// Subtract a sorted, disjoint busy set from one working window.
///
/// Walks the busy list with a cursor starting at `working.start`. Busy
/// ranges that end at or before the cursor are skipped and the scan stops at
/// the first busy range starting at or after `working.end`. The returned free
/// ranges are ordered, disjoint and contained in `working`.
pub fn subtract_busy_from_working(working: &TimeRange, busy: &[TimeRange]) -> Vec<TimeRange> {
    if !working.is_valid() {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = working.start;

    for b in busy {
        if b.end <= cursor {
            continue;
        }
        if b.start >= working.end {
            break;
        }
        if b.start > cursor {
            free.push(TimeRange {
                start: cursor,
                end: b.start,
            });
        }
        cursor = cursor.max(b.end);
    }

    // Trailing free range after the last busy period.
    if cursor < working.end {
        free.push(TimeRange {
            start: cursor,
            end: working.end,
        });
    }

    free
}

/// The parts of `busy` that fall inside `working`, in order.
pub fn intersect_with(working: &TimeRange, busy: &[TimeRange]) -> Vec<TimeRange> {
    busy.iter()
        .filter_map(|b| working.intersection(b))
        .collect()
}
