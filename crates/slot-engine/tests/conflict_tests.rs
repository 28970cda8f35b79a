//! Tests for booking overlap detection.

use chrono::{TimeZone, Utc};
use slot_engine::conflict::{find_conflicts, has_conflict, overlaps};
use slot_engine::interval::TimeRange;

/// Helper to create a TimeRange from hour ranges on a given day.
fn range(
    year: i32,
    month: u32,
    day: u32,
    start_hour: u32,
    start_min: u32,
    end_hour: u32,
    end_min: u32,
) -> TimeRange {
    TimeRange {
        start: Utc
            .with_ymd_and_hms(year, month, day, start_hour, start_min, 0)
            .unwrap(),
        end: Utc
            .with_ymd_and_hms(year, month, day, end_hour, end_min, 0)
            .unwrap(),
    }
}

#[test]
fn overlapping_booking_detected_with_overlap_minutes() {
    // Candidate 09:00-10:00, existing 09:30-10:30 → 30-min overlap
    let candidate = range(2026, 3, 1, 9, 0, 10, 0);
    let existing = vec![range(2026, 3, 1, 9, 30, 10, 30)];

    let conflicts = find_conflicts(&candidate, &existing);

    assert_eq!(conflicts.len(), 1, "should detect exactly one conflict");
    assert_eq!(conflicts[0].overlap_minutes, 30);
    assert_eq!(conflicts[0].existing, existing[0]);
}

#[test]
fn non_overlapping_booking_no_conflict() {
    let candidate = range(2026, 3, 1, 9, 0, 10, 0);
    let existing = vec![range(2026, 3, 1, 11, 0, 12, 0)];

    assert!(find_conflicts(&candidate, &existing).is_empty());
    assert!(!has_conflict(&candidate, &existing));
}

#[test]
fn adjacent_bookings_not_a_conflict() {
    // Back-to-back appointments share a boundary only.
    let candidate = range(2026, 3, 1, 10, 0, 11, 0);
    let existing = vec![
        range(2026, 3, 1, 9, 0, 10, 0),
        range(2026, 3, 1, 11, 0, 12, 0),
    ];

    assert!(
        find_conflicts(&candidate, &existing).is_empty(),
        "adjacent bookings should not be conflicts"
    );
}

#[test]
fn candidate_inside_existing_is_a_conflict() {
    let candidate = range(2026, 3, 1, 10, 15, 10, 45);
    let existing = vec![range(2026, 3, 1, 10, 0, 11, 0)];

    let conflicts = find_conflicts(&candidate, &existing);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].overlap_minutes, 30);
}

#[test]
fn every_overlapping_booking_is_reported() {
    let candidate = range(2026, 3, 1, 9, 0, 12, 0);
    let existing = vec![
        range(2026, 3, 1, 8, 30, 9, 30),
        range(2026, 3, 1, 10, 0, 10, 30),
        range(2026, 3, 1, 12, 0, 13, 0),
    ];

    let conflicts = find_conflicts(&candidate, &existing);
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].overlap_minutes, 30);
    assert_eq!(conflicts[1].overlap_minutes, 30);
}

#[test]
fn overlap_predicate_is_symmetric() {
    let a = range(2026, 3, 1, 9, 0, 10, 0);
    let b = range(2026, 3, 1, 9, 59, 11, 0);
    assert!(overlaps(a.start, a.end, b.start, b.end));
    assert!(overlaps(b.start, b.end, a.start, a.end));
}
