//! Working-hour resolution for a single calendar date.
//!
//! A provider's hours come either from a structured weekly schedule with
//! date-specific overrides, or from the older flat opening/closing fields.
//! Both shapes resolve once into a [`DayPlan`], a normalized list of working
//! windows for the requested date, so booking code never branches on the
//! schedule representation again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SlotError};
use crate::interval::TimeRange;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time of day in whole minutes, `00:00` through `24:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallClock(u32);

impl WallClock {
    pub const MIDNIGHT: WallClock = WallClock(0);
    pub const END_OF_DAY: WallClock = WallClock(MINUTES_PER_DAY);

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self> {
        let total = hour * 60 + minute;
        if minute >= 60 || total > MINUTES_PER_DAY {
            return Err(SlotError::InvalidTime(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(WallClock(total))
    }

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if minutes > MINUTES_PER_DAY {
            return Err(SlotError::InvalidTime(format!("{} minutes", minutes)));
        }
        Ok(WallClock(minutes))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// This time of day on `date`, placed on the reference axis.
    pub fn on(self, date: NaiveDate) -> DateTime<Utc> {
        reference_midnight(date) + Duration::minutes(i64::from(self.0))
    }
}

impl FromStr for WallClock {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SlotError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        WallClock::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for WallClock {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WallClock> for String {
    fn from(value: WallClock) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Midnight of `date` on the reference axis.
pub fn reference_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Day-of-week key used by schedule documents (`sun` … `sat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "sunday")]
    Sun,
    #[serde(alias = "monday")]
    Mon,
    #[serde(alias = "tuesday")]
    Tue,
    #[serde(alias = "wednesday")]
    Wed,
    #[serde(alias = "thursday")]
    Thu,
    #[serde(alias = "friday")]
    Fri,
    #[serde(alias = "saturday")]
    Sat,
}

impl DayOfWeek {
    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    pub fn short_name(self) -> &'static str {
        match self {
            DayOfWeek::Sun => "sun",
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            DayOfWeek::Sun => "sunday",
            DayOfWeek::Mon => "monday",
            DayOfWeek::Tue => "tuesday",
            DayOfWeek::Wed => "wednesday",
            DayOfWeek::Thu => "thursday",
            DayOfWeek::Fri => "friday",
            DayOfWeek::Sat => "saturday",
        }
    }

    /// Case-insensitive match against either spelling (`Mon`, `monday`).
    pub fn matches(self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.short_name()) || name.eq_ignore_ascii_case(self.full_name())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Sun => DayOfWeek::Sun,
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
        }
    }
}

/// One recurring weekly entry. A weekday may carry several (split shifts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day_of_week: DayOfWeek,
    pub start_time: WallClock,
    pub end_time: WallClock,
}

/// A date-specific exception to the weekly pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateOverride {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_unavailable: bool,
    #[serde(default)]
    pub start_time: Option<WallClock>,
    #[serde(default)]
    pub end_time: Option<WallClock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSchedule {
    pub days: Vec<ScheduleEntry>,
    #[serde(default)]
    pub overrides: Vec<DateOverride>,
}

/// Flat opening hours gated by a comma-separated weekday list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySchedule {
    pub opening_time: WallClock,
    pub closing_time: WallClock,
    pub work_days: String,
}

impl LegacySchedule {
    pub fn works_on(&self, day: DayOfWeek) -> bool {
        self.work_days.split(',').any(|name| day.matches(name))
    }
}

/// A provider's schedule in either supported shape.
///
/// Deserializes from the structured document (`days`, `overrides`) or from
/// the legacy flat fields (`openingTime`, `closingTime`, `workDays`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schedule {
    Structured(StructuredSchedule),
    Legacy(LegacySchedule),
}

/// Where a [`DayPlan`]'s windows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySource {
    Override,
    OverrideUnavailable,
    Recurring,
    DayOff,
    Legacy,
}

/// A working window as wall-clock bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: WallClock,
    pub end: WallClock,
}

impl WorkingHours {
    fn checked(start: WallClock, end: WallClock, date: NaiveDate) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            warn!(%date, %start, %end, "dropping working window that does not end after it starts");
            None
        }
    }

    pub fn contains(&self, start_minutes: u32, end_minutes: u32) -> bool {
        self.start.minutes() <= start_minutes && end_minutes <= self.end.minutes()
    }

    pub fn to_range(&self, date: NaiveDate) -> TimeRange {
        TimeRange {
            start: self.start.on(date),
            end: self.end.on(date),
        }
    }
}

/// The resolved working windows of one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub windows: Vec<WorkingHours>,
    pub source: DaySource,
}

impl DayPlan {
    pub fn is_open(&self) -> bool {
        !self.windows.is_empty()
    }

    /// The windows placed on the reference axis of this date.
    pub fn reference_windows(&self) -> Vec<TimeRange> {
        self.windows.iter().map(|w| w.to_range(self.date)).collect()
    }

    /// True when `[start, start + length)` fits inside one window.
    pub fn contains(&self, start: WallClock, length_minutes: u32) -> bool {
        let begin = start.minutes();
        let Some(end) = begin.checked_add(length_minutes) else {
            return false;
        };
        self.windows.iter().any(|w| w.contains(begin, end))
    }
}

impl Schedule {
    /// Resolve the working windows for `date`.
    ///
    /// A date override wins over the weekly pattern: an unavailable override
    /// closes the day, an override with both times is the only window. An
    /// override carrying neither flag nor complete times leaves the weekly
    /// pattern in effect.
    pub fn working_windows(&self, date: NaiveDate) -> DayPlan {
        let day = DayOfWeek::of(date);
        match self {
            Schedule::Structured(s) => resolve_structured(s, date, day),
            Schedule::Legacy(l) => {
                let windows = if l.works_on(day) {
                    WorkingHours::checked(l.opening_time, l.closing_time, date)
                        .into_iter()
                        .collect()
                } else {
                    Vec::new()
                };
                let source = if windows.is_empty() {
                    DaySource::DayOff
                } else {
                    DaySource::Legacy
                };
                DayPlan { date, windows, source }
            }
        }
    }
}

fn resolve_structured(schedule: &StructuredSchedule, date: NaiveDate, day: DayOfWeek) -> DayPlan {
    if let Some(ov) = schedule.overrides.iter().find(|o| o.date == date) {
        if ov.is_unavailable {
            return DayPlan {
                date,
                windows: Vec::new(),
                source: DaySource::OverrideUnavailable,
            };
        }
        if let (Some(start), Some(end)) = (ov.start_time, ov.end_time) {
            let windows: Vec<WorkingHours> =
                WorkingHours::checked(start, end, date).into_iter().collect();
            let source = if windows.is_empty() {
                DaySource::OverrideUnavailable
            } else {
                DaySource::Override
            };
            return DayPlan { date, windows, source };
        }
    }

    let mut windows: Vec<WorkingHours> = schedule
        .days
        .iter()
        .filter(|e| e.day_of_week == day)
        .filter_map(|e| WorkingHours::checked(e.start_time, e.end_time, date))
        .collect();
    windows.sort_by_key(|w| (w.start, w.end));

    let source = if windows.is_empty() {
        DaySource::DayOff
    } else {
        DaySource::Recurring
    };
    DayPlan { date, windows, source }
}

/// How the per-day booking cap is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    #[default]
    Unlimited,
    MaxPerDay,
}

/// A cap on the number of non-cancelled bookings per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLimit {
    #[serde(default)]
    pub mode: LimitMode,
    #[serde(default)]
    pub max_appointments_per_day: Option<u32>,
}

impl DailyLimit {
    pub fn max_per_day(max: u32) -> Self {
        Self {
            mode: LimitMode::MaxPerDay,
            max_appointments_per_day: Some(max),
        }
    }

    /// True when `booked` already meets or exceeds the cap.
    pub fn is_reached(&self, booked: usize) -> bool {
        match (self.mode, self.max_appointments_per_day) {
            (LimitMode::MaxPerDay, Some(max)) => booked >= max as usize,
            _ => false,
        }
    }
}
