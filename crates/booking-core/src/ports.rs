//! Contracts for persistence and external side effects.
//!
//! The booking service depends only on these traits. A database, a calendar
//! API client or an SMS gateway plugs in by implementing one of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{SideEffectError, StoreError};
use crate::model::{Booking, ServiceOffering, StaffProfile};

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn staff(&self, staff_id: &str) -> Result<Option<StaffProfile>, StoreError>;

    async fn service(&self, service_id: &str) -> Result<Option<ServiceOffering>, StoreError>;

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Bookings of any status for `staff_id` whose UTC range overlaps
    /// `[from, to)`, minus `exclude` if given.
    async fn bookings_between(
        &self,
        staff_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Persist a new booking.
    ///
    /// Implementations must reject a second active booking with the same
    /// `(staff_id, start_time_utc)` with [`StoreError::Duplicate`].
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    /// Replace an existing booking. The same uniqueness rule as
    /// [`BookingStore::insert`] applies.
    async fn update(&self, booking: &Booking) -> Result<(), StoreError>;
}

/// Mirror of bookings in an external calendar.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Create an event and return its id.
    async fn create_event(&self, booking: &Booking) -> Result<String, SideEffectError>;

    async fn update_event(&self, event_id: &str, booking: &Booking) -> Result<(), SideEffectError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), SideEffectError>;
}

/// One delivery channel (SMS, email) for booking notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in log fields.
    fn channel(&self) -> &str;

    async fn booking_confirmed(&self, booking: &Booking) -> Result<(), SideEffectError>;

    async fn booking_rescheduled(
        &self,
        booking: &Booking,
        previous_start: DateTime<Utc>,
    ) -> Result<(), SideEffectError>;

    async fn booking_cancelled(&self, booking: &Booking) -> Result<(), SideEffectError>;
}
