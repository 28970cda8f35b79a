//! Property-based tests for the availability engine using proptest.
//!
//! These tests verify invariants that should hold for *any* working window
//! and booking set, not just the fixed scenarios in `availability_tests.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::availability::{available_slots_for_window, free_ranges_for_window, AvailabilityOptions};
use slot_engine::interval::{
    expand_intervals, intersect_with, merge_intervals, subtract_busy_from_working, TimeRange,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn minute(m: i64) -> DateTime<Utc> {
    base() + Duration::minutes(m)
}

/// A range somewhere on a 36-hour axis around the reference day.
fn arb_range() -> impl Strategy<Value = TimeRange> {
    (-360i64..1800, 1i64..240).prop_map(|(start, len)| TimeRange {
        start: minute(start),
        end: minute(start + len),
    })
}

fn arb_ranges() -> impl Strategy<Value = Vec<TimeRange>> {
    prop::collection::vec(arb_range(), 0..12)
}

fn arb_window() -> impl Strategy<Value = TimeRange> {
    (0i64..720, 30i64..720).prop_map(|(start, len)| TimeRange {
        start: minute(start),
        end: minute(start + len),
    })
}

fn arb_options() -> impl Strategy<Value = AvailabilityOptions> {
    (
        prop_oneof![Just(15i64), Just(30), Just(45), Just(60), Just(90)],
        prop::option::of(prop_oneof![Just(5i64), Just(15), Just(30)]),
        0i64..30,
        0i64..30,
        prop::option::of(0i64..1440),
        prop::option::of(prop_oneof![Just(5i64), Just(10), Just(15), Just(30), Just(60)]),
    )
        .prop_map(|(len, step, before, after, earliest, align)| AvailabilityOptions {
            slot_length_minutes: len,
            slot_step_minutes: step,
            buffer_before_minutes: before,
            buffer_after_minutes: after,
            earliest_start: earliest.map(minute),
            align_to_minutes: align,
            format: Default::default(),
        })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

fn busy_for(bookings: &[TimeRange], options: &AvailabilityOptions) -> Vec<TimeRange> {
    merge_intervals(&expand_intervals(
        bookings,
        Duration::minutes(options.buffer_before_minutes),
        Duration::minutes(options.buffer_after_minutes),
    ))
}

fn slots(window: &TimeRange, bookings: &[TimeRange], options: &AvailabilityOptions) -> Vec<TimeRange> {
    available_slots_for_window(window.start, window.end, bookings, options)
        .unwrap()
        .into_ranges()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Property 1: free ∪ (busy ∩ working) == working, and the two are disjoint
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn free_and_busy_partition_the_window(window in arb_window(), bookings in arb_ranges()) {
        let busy = merge_intervals(&bookings);
        let free = subtract_busy_from_working(&window, &busy);
        let inside = intersect_with(&window, &busy);

        for f in &free {
            prop_assert!(window.contains(f), "free range {:?} escapes window", f);
            for b in &inside {
                prop_assert!(!f.overlaps(b), "free {:?} overlaps busy {:?}", f, b);
            }
        }

        let mut pieces: Vec<TimeRange> = free.iter().chain(inside.iter()).copied().collect();
        pieces.sort();
        prop_assert!(!pieces.is_empty());
        prop_assert_eq!(pieces[0].start, window.start);
        prop_assert_eq!(pieces[pieces.len() - 1].end, window.end);
        for pair in pieces.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start, "gap or overlap between pieces");
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: slots stay inside the window and never touch a busy interval
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_avoid_busy_and_stay_in_window(
        window in arb_window(),
        bookings in arb_ranges(),
        options in arb_options(),
    ) {
        let busy = busy_for(&bookings, &options);
        for s in slots(&window, &bookings, &options) {
            prop_assert!(window.contains(&s), "slot {:?} escapes window", s);
            prop_assert_eq!(s.duration_minutes(), options.slot_length_minutes);
            for b in &busy {
                prop_assert!(!s.overlaps(b), "slot {:?} overlaps busy {:?}", s, b);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: slots from different free ranges never overlap each other
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_from_distinct_free_ranges_are_disjoint(
        window in arb_window(),
        bookings in arb_ranges(),
        options in arb_options(),
    ) {
        let free = free_ranges_for_window(window.start, window.end, &bookings, &options);
        let all = slots(&window, &bookings, &options);
        let owner = |s: &TimeRange| free.iter().position(|f| f.contains(s));

        for (i, a) in all.iter().enumerate() {
            prop_assert!(owner(a).is_some(), "slot {:?} not inside any free range", a);
            for b in &all[i + 1..] {
                if owner(a) != owner(b) {
                    prop_assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: every slot start sits on the grid
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slot_starts_are_grid_aligned(
        window in arb_window(),
        bookings in arb_ranges(),
        options in arb_options(),
        grid in prop_oneof![Just(5i64), Just(15), Just(30), Just(60)],
    ) {
        // Keep the step a multiple of the grid so every start stays aligned.
        let options = AvailabilityOptions {
            align_to_minutes: Some(grid),
            slot_step_minutes: Some(grid),
            ..options
        };
        let grid_ms = grid * 60_000;
        for s in slots(&window, &bookings, &options) {
            prop_assert_eq!(s.start.timestamp_millis().rem_euclid(grid_ms), 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: nothing starts before earliest_start
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn lead_time_is_respected(
        window in arb_window(),
        bookings in arb_ranges(),
        options in arb_options(),
        earliest in 0i64..1440,
    ) {
        let options = AvailabilityOptions {
            earliest_start: Some(minute(earliest)),
            ..options
        };
        for s in slots(&window, &bookings, &options) {
            prop_assert!(s.start >= minute(earliest));
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: merge is idempotent and yields disjoint sorted ranges
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_is_idempotent(ranges in arb_ranges()) {
        let once = merge_intervals(&ranges);
        let twice = merge_intervals(&once);
        prop_assert_eq!(&once, &twice);
        for pair in once.windows(2) {
            prop_assert!(pair[0].end < pair[1].start, "merged ranges must not touch");
        }
    }
}

// ---------------------------------------------------------------------------
// Property 7: same inputs, same output
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn engine_is_deterministic(
        window in arb_window(),
        bookings in arb_ranges(),
        options in arb_options(),
    ) {
        let a = available_slots_for_window(window.start, window.end, &bookings, &options).unwrap();
        let b = available_slots_for_window(window.start, window.end, &bookings, &options).unwrap();
        prop_assert_eq!(a, b);
    }
}
