//! Records the booking transaction reads and writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::schedule::{DailyLimit, Schedule, WallClock};
use slot_engine::TimeRange;
use uuid::Uuid;

/// Lifecycle state of a booking. Only `Cancelled` frees the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Pending,
    Cancelled,
}

impl BookingStatus {
    /// True when a booking in this state blocks its time range.
    pub fn is_active(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A persisted appointment.
///
/// `date` and `time` are the provider-local wall clock the customer picked.
/// The UTC instants are derived from them once, at booking time, with the
/// configured [`slot_engine::DstPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub business_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub customer: Customer,
    pub date: NaiveDate,
    pub time: WallClock,
    pub start_time_utc: DateTime<Utc>,
    pub end_time_utc: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
}

impl Booking {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time_utc,
            end: self.end_time_utc,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time_utc - self.start_time_utc).num_minutes()
    }
}

/// A bookable provider with their zone, hours and daily cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub id: String,
    pub business_id: String,
    /// IANA zone name, e.g. `America/New_York`.
    pub timezone: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub daily_limit: DailyLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
}

/// A customer's request for a specific local date and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub staff_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub time: WallClock,
    pub customer: Customer,
}
