use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use slot_engine::availability::{available_slots_for_window, AvailabilityOptions};
use slot_engine::interval::TimeRange;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
}

// Back-to-back 20-minute bookings separated by 10-minute gaps from 08:00.
fn busy_day(count: usize) -> Vec<TimeRange> {
    (0..count as i64)
        .map(|i| {
            let start = at(8, 0) + Duration::minutes(i * 30);
            TimeRange {
                start,
                end: start + Duration::minutes(20),
            }
        })
        .collect()
}

fn benchmark_available_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("available_slots_for_window");

    let options = AvailabilityOptions::new(30).with_alignment(15);
    group.bench_function("empty_day", |b| {
        b.iter(|| available_slots_for_window(black_box(at(9, 0)), black_box(at(17, 0)), &[], &options))
    });

    let bookings = busy_day(20);
    let buffered = AvailabilityOptions::new(15)
        .with_buffers(5, 5)
        .with_alignment(5)
        .with_earliest_start(at(10, 10));
    group.bench_function("twenty_bookings_with_buffers", |b| {
        b.iter(|| {
            available_slots_for_window(
                black_box(at(8, 0)),
                black_box(at(20, 0)),
                black_box(&bookings),
                &buffered,
            )
        })
    });

    // Unscoped callers pass a whole month of bookings.
    let month: Vec<TimeRange> = (0..30)
        .flat_map(|day| {
            busy_day(12)
                .into_iter()
                .map(move |r| TimeRange {
                    start: r.start + Duration::days(day),
                    end: r.end + Duration::days(day),
                })
        })
        .collect();
    group.bench_function("unscoped_month_of_bookings", |b| {
        b.iter(|| available_slots_for_window(black_box(at(9, 0)), black_box(at(17, 0)), black_box(&month), &options))
    });

    group.finish();
}

criterion_group!(benches, benchmark_available_slots);
criterion_main!(benches);
