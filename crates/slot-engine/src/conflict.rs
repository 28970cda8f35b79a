//! Detect overlaps between a requested booking and existing ones.
//!
//! Intervals are half-open: a booking ending exactly when another starts is
//! NOT a conflict.

use crate::interval::TimeRange;
use chrono::{DateTime, Utc};

/// A detected conflict between a candidate range and one existing range.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub candidate: TimeRange,
    pub existing: TimeRange,
    pub overlap_minutes: i64,
}

/// Half-open overlap test: `a_start < b_end && a_end > b_start`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Every existing range that overlaps `candidate`, with the overlap length.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(candidate: &TimeRange, existing: &[TimeRange]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|e| overlaps(candidate.start, candidate.end, e.start, e.end))
        .map(|e| {
            let overlap_start = candidate.start.max(e.start);
            let overlap_end = candidate.end.min(e.end);
            Conflict {
                candidate: *candidate,
                existing: *e,
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect()
}

/// True when `candidate` overlaps any of `existing`.
pub fn has_conflict(candidate: &TimeRange, existing: &[TimeRange]) -> bool {
    existing
        .iter()
        .any(|e| overlaps(candidate.start, candidate.end, e.start, e.end))
}
