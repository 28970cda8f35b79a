//! In-process [`BookingStore`] backed by hash maps.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Booking, ServiceOffering, StaffProfile};
use crate::ports::BookingStore;

/// A [`BookingStore`] held entirely in memory.
///
/// Enforces the same `(staff_id, start_time_utc)` uniqueness rule a database
/// unique index would.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    staff: RwLock<HashMap<String, StaffProfile>>,
    services: RwLock<HashMap<String, ServiceOffering>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_staff(&self, staff: StaffProfile) {
        self.staff.write().await.insert(staff.id.clone(), staff);
    }

    pub async fn add_service(&self, service: ServiceOffering) {
        self.services.write().await.insert(service.id.clone(), service);
    }

    /// Every stored booking, ordered by start time.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        let mut all: Vec<Booking> = self.bookings.read().await.values().cloned().collect();
        all.sort_by_key(|b| (b.start_time_utc, b.id));
        all
    }
}

fn check_unique(bookings: &HashMap<Uuid, Booking>, candidate: &Booking) -> Result<(), StoreError> {
    if !candidate.status.is_active() {
        return Ok(());
    }
    let taken = bookings.values().any(|b| {
        b.id != candidate.id
            && b.status.is_active()
            && b.staff_id == candidate.staff_id
            && b.start_time_utc == candidate.start_time_utc
    });
    if taken {
        return Err(StoreError::Duplicate {
            staff_id: candidate.staff_id.clone(),
            start: candidate.start_time_utc,
        });
    }
    Ok(())
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn staff(&self, staff_id: &str) -> Result<Option<StaffProfile>, StoreError> {
        Ok(self.staff.read().await.get(staff_id).cloned())
    }

    async fn service(&self, service_id: &str) -> Result<Option<ServiceOffering>, StoreError> {
        Ok(self.services.read().await.get(service_id).cloned())
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn bookings_between(
        &self,
        staff_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| b.staff_id == staff_id)
            .filter(|b| Some(b.id) != exclude)
            .filter(|b| b.start_time_utc < to && b.end_time_utc > from)
            .cloned()
            .collect();
        found.sort_by_key(|b| (b.start_time_utc, b.id));
        Ok(found)
    }

    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        check_unique(&bookings, booking)?;
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        if !bookings.contains_key(&booking.id) {
            return Err(StoreError::MissingRow(booking.id));
        }
        check_unique(&bookings, booking)?;
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }
}
