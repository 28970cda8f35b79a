//! The day-request document read by `available` and `check`.

use anyhow::{Context, Result};
use booking_core::{
    Booking, BookingPolicy, BookingService, BookingStatus, BookingStore, Customer, InMemoryStore,
    ServiceOffering, StaffProfile,
};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::Deserialize;
use slot_engine::dst::{parse_timezone, utc_to_local_reference};
use slot_engine::schedule::{DailyLimit, Schedule, WallClock};
use std::sync::Arc;
use uuid::Uuid;

pub const STAFF_ID: &str = "staff";
pub const SERVICE_ID: &str = "service";

/// One provider, one service and one date.
///
/// ```json
/// {
///   "timezone": "America/New_York",
///   "date": "2024-01-15",
///   "serviceDurationMinutes": 30,
///   "schedule": {"openingTime": "09:00", "closingTime": "17:00", "workDays": "mon,tue"},
///   "dailyLimit": {"mode": "max_per_day", "maxAppointmentsPerDay": 8},
///   "now": "2024-01-10T12:00:00Z",
///   "bookings": [{"start": "2024-01-15T15:00:00Z", "end": "2024-01-15T16:00:00Z"}]
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRequest {
    pub timezone: String,
    pub date: NaiveDate,
    pub service_duration_minutes: u32,
    pub schedule: Schedule,
    #[serde(default)]
    pub daily_limit: DailyLimit,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bookings: Vec<ExistingBooking>,
}

/// An existing booking given by its UTC instants.
#[derive(Debug, Deserialize)]
pub struct ExistingBooking {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub status: BookingStatus,
}

impl DayRequest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse day request JSON")
    }

    /// A booking service over an in-memory store seeded with this request's
    /// provider, service and bookings.
    pub async fn into_service(self, policy: BookingPolicy) -> Result<BookingService> {
        let tz = parse_timezone(&self.timezone)?;
        let store = Arc::new(InMemoryStore::new());
        store
            .add_staff(StaffProfile {
                id: STAFF_ID.to_string(),
                business_id: STAFF_ID.to_string(),
                timezone: self.timezone,
                schedule: self.schedule,
                daily_limit: self.daily_limit,
            })
            .await;
        store
            .add_service(ServiceOffering {
                id: SERVICE_ID.to_string(),
                name: SERVICE_ID.to_string(),
                duration_minutes: self.service_duration_minutes,
            })
            .await;

        for existing in self.bookings {
            let local = utc_to_local_reference(existing.start, &tz);
            let booking = Booking {
                id: Uuid::new_v4(),
                business_id: STAFF_ID.to_string(),
                staff_id: STAFF_ID.to_string(),
                service_id: SERVICE_ID.to_string(),
                customer: Customer::default(),
                date: local.date_naive(),
                time: WallClock::from_hm(local.hour(), local.minute())?,
                start_time_utc: existing.start,
                end_time_utc: existing.end,
                status: existing.status,
                calendar_event_id: None,
            };
            store
                .insert(&booking)
                .await
                .with_context(|| format!("Failed to load booking starting {}", existing.start))?;
        }

        Ok(BookingService::new(store, policy)?)
    }
}
