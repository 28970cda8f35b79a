//! Local wall-clock time to UTC conversion.
//!
//! Two conversions are offered. [`local_time_to_utc`] is the single-step
//! offset estimate stored booking timestamps have always been computed with;
//! it can be off by the DST delta for wall-clock times on a transition day.
//! [`local_time_to_utc_exact`] resolves through the zone database instead.
//! [`DstPolicy`] picks one.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Which conversion turns a provider's local booking time into UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Single-iteration offset estimate (see [`local_time_to_utc`]).
    #[default]
    Approximate,
    /// Zone-database resolution (see [`local_time_to_utc_exact`]).
    ZoneDatabase,
}

impl DstPolicy {
    pub fn to_utc(self, date: NaiveDate, hour: u32, minute: u32, timezone: &str) -> Result<DateTime<Utc>> {
        match self {
            DstPolicy::Approximate => {
                local_time_to_utc(date.year(), date.month(), date.day(), hour, minute, timezone)
            }
            DstPolicy::ZoneDatabase => {
                local_time_to_utc_exact(date.year(), date.month(), date.day(), hour, minute, timezone)
            }
        }
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(timezone: &str) -> Result<Tz> {
    timezone
        .parse()
        .map_err(|_| SlotError::InvalidTimezone(timezone.to_string()))
}

/// Convert a wall-clock reading in `timezone` to a UTC instant using a
/// single offset estimate.
///
/// The fields are first read as if they were UTC (the reference instant).
/// That instant is formatted in the target zone, and the difference between
/// the formatted and the requested wall clock, in minutes and corrected for a
/// date change, is taken as the zone offset and subtracted from the
/// reference instant.
///
/// The offset is sampled at the reference instant rather than at the answer,
/// so on a DST transition day the result can be off by the DST delta. For
/// `2024-03-10 02:30` in `America/New_York` this yields `07:30Z`.
///
/// # Errors
/// Returns `SlotError::InvalidTimezone` for unknown zones and
/// `SlotError::InvalidDate` for impossible calendar fields.
pub fn local_time_to_utc(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    timezone: &str,
) -> Result<DateTime<Utc>> {
    let tz = parse_timezone(timezone)?;

    let reference = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| invalid_date(year, month, day, hour, minute))?;

    let formatted = reference.with_timezone(&tz).naive_local();
    let day_diff = (formatted.date() - reference.date_naive()).num_days();

    let formatted_minutes = i64::from(formatted.hour() * 60 + formatted.minute());
    let requested_minutes = i64::from(hour * 60 + minute);
    let offset_minutes = day_diff * 24 * 60 + formatted_minutes - requested_minutes;

    Ok(reference - Duration::minutes(offset_minutes))
}

/// Convert a wall-clock reading in `timezone` to UTC through the zone database.
///
/// Ambiguous readings (the repeated hour when clocks go back) resolve to the
/// earlier instant. Readings inside a spring-forward gap are interpreted with
/// the offset in effect before the gap, so `02:30` on a one-hour gap day maps
/// to `03:30` local.
pub fn local_time_to_utc_exact(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    timezone: &str,
) -> Result<DateTime<Utc>> {
    let tz = parse_timezone(timezone)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| invalid_date(year, month, day, hour, minute))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let before_gap = tz
                .from_local_datetime(&(naive - Duration::days(1)))
                .earliest()
                .ok_or_else(|| invalid_date(year, month, day, hour, minute))?;
            let offset_seconds = before_gap.offset().fix().local_minus_utc();
            Ok((naive - Duration::seconds(i64::from(offset_seconds))).and_utc())
        }
    }
}

/// Project a UTC instant onto the reference axis of `tz`: the local wall
/// clock reading, stored as if it were UTC.
pub fn utc_to_local_reference(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    instant.with_timezone(tz).naive_local().and_utc()
}

fn invalid_date(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> SlotError {
    SlotError::InvalidDate(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        year, month, day, hour, minute
    ))
}
