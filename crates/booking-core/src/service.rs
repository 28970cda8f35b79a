//! The booking transaction: availability listing, create, reschedule and
//! cancel.
//!
//! Validation of a requested time runs in a fixed order: the day must be open
//! and under its cap, the slot must fit a working window, it must not overlap
//! an active booking, and it must lie in the future. Every write (create,
//! reschedule, cancel, linking a calendar event) is serialized per staff
//! member and works from a fresh read of the booking, so two concurrent
//! requests cannot both pass the overlap check and a cancellation is never
//! overwritten. The store's uniqueness rule backs this up across processes.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use slot_engine::availability::{available_slots_for_window, SlotOutput};
use slot_engine::dst::{parse_timezone, utc_to_local_reference};
use slot_engine::schedule::{reference_midnight, WallClock};
use slot_engine::slots::{align_up, format_wall_clock};
use slot_engine::{TimeRange, MAX_OPTION_MINUTES};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{BookingError, Result, StoreError, UnavailableReason};
use crate::model::{Booking, BookingRequest, BookingStatus, ServiceOffering, StaffProfile};
use crate::policy::BookingPolicy;
use crate::ports::{BookingStore, CalendarSync, Notifier};

/// One async mutex per staff member, created on first use.
#[derive(Default)]
struct StaffLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl StaffLocks {
    fn for_staff(&self, staff_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(staff_id.to_string()).or_default().clone()
    }
}

/// Books appointments against a [`BookingStore`].
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    calendar: Option<Arc<dyn CalendarSync>>,
    notifiers: Vec<Arc<dyn Notifier>>,
    policy: BookingPolicy,
    locks: StaffLocks,
}

impl BookingService {
    /// # Errors
    /// Returns `BookingError::Configuration` if `policy` does not validate.
    pub fn new(store: Arc<dyn BookingStore>, policy: BookingPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            store,
            calendar: None,
            notifiers: Vec::new(),
            policy,
            locks: StaffLocks::default(),
        })
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSync>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Start times (`HH:MM`, provider-local) at which `service_id` can be
    /// booked with `staff_id` on `date`, sorted and de-duplicated.
    ///
    /// Empty when the day is closed, the daily cap is reached or `date` is
    /// already past in the provider's zone.
    #[instrument(skip(self))]
    pub async fn available_times(
        &self,
        staff_id: &str,
        service_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let staff = self.load_staff(staff_id).await?;
        let service = self.load_service(service_id).await?;
        let tz = parse_timezone(&staff.timezone)?;

        let plan = staff.schedule.working_windows(date);
        if !plan.is_open() {
            debug!(source = ?plan.source, "no working windows");
            return Ok(Vec::new());
        }

        let local_now = utc_to_local_reference(now, &tz);
        if date < local_now.date_naive() {
            return Ok(Vec::new());
        }

        let existing = self.active_bookings_near(&staff, date, None).await?;
        if staff.daily_limit.is_reached(count_on(&existing, date)) {
            debug!("daily limit reached");
            return Ok(Vec::new());
        }

        let busy: Vec<TimeRange> = existing
            .iter()
            .map(|b| TimeRange {
                start: utc_to_local_reference(b.start_time_utc, &tz),
                end: utc_to_local_reference(b.end_time_utc, &tz),
            })
            .collect();
        let earliest = earliest_offer(local_now, self.policy.min_lead_minutes);
        let options = self
            .policy
            .availability_options(i64::from(service.duration_minutes), Some(earliest));

        let mut times = BTreeSet::new();
        for window in plan.reference_windows() {
            if let SlotOutput::Ranges(slots) =
                available_slots_for_window(window.start, window.end, &busy, &options)?
            {
                times.extend(slots.iter().map(format_wall_clock));
            }
        }
        Ok(times.into_iter().collect())
    }

    /// Book `request` if the requested time is still free.
    #[instrument(
        skip(self, request),
        fields(staff = %request.staff_id, date = %request.date, time = %request.time)
    )]
    pub async fn create(&self, request: BookingRequest, now: DateTime<Utc>) -> Result<Booking> {
        let staff = self.load_staff(&request.staff_id).await?;
        let service = self.load_service(&request.service_id).await?;
        let tz = parse_timezone(&staff.timezone)?;

        let lock = self.locks.for_staff(&staff.id);
        let booking = {
            let _guard = lock.lock().await;
            let (start, end) = self
                .validate_slot(&staff, &tz, request.date, request.time, service.duration_minutes, None, now)
                .await?;

            let booking = Booking {
                id: Uuid::new_v4(),
                business_id: staff.business_id.clone(),
                staff_id: staff.id.clone(),
                service_id: service.id.clone(),
                customer: request.customer,
                date: request.date,
                time: request.time,
                start_time_utc: start,
                end_time_utc: end,
                status: BookingStatus::Confirmed,
                calendar_event_id: None,
            };
            self.store.insert(&booking).await.map_err(duplicate_as_conflict)?;
            booking
        };
        info!(booking_id = %booking.id, start = %booking.start_time_utc, "booking created");

        let booking = self.link_calendar_event(booking).await;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.booking_confirmed(&booking).await {
                warn!(booking_id = %booking.id, channel = notifier.channel(), error = %e, "confirmation not delivered");
            }
        }
        Ok(booking)
    }

    /// Move a booking to a new local date and time, keeping its duration.
    #[instrument(skip(self))]
    pub async fn reschedule(
        &self,
        id: Uuid,
        date: NaiveDate,
        time: WallClock,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let staff_id = self.load_booking(id).await?.staff_id;
        let staff = self.load_staff(&staff_id).await?;
        let tz = parse_timezone(&staff.timezone)?;

        let lock = self.locks.for_staff(&staff.id);
        let (booking, previous_start) = {
            let _guard = lock.lock().await;
            let current = self.load_booking(id).await?;
            if !current.status.is_active() {
                return Err(BookingError::AlreadyTerminal(id));
            }
            let duration = u32::try_from(current.duration_minutes()).map_err(|_| {
                BookingError::Configuration(format!("booking {id} has a negative duration"))
            })?;
            let (start, end) = self
                .validate_slot(&staff, &tz, date, time, duration, Some(id), now)
                .await?;

            let previous_start = current.start_time_utc;
            let booking = Booking {
                date,
                time,
                start_time_utc: start,
                end_time_utc: end,
                ..current
            };
            self.store.update(&booking).await.map_err(duplicate_as_conflict)?;
            (booking, previous_start)
        };
        info!(booking_id = %booking.id, from = %previous_start, to = %booking.start_time_utc, "booking rescheduled");

        if let (Some(calendar), Some(event_id)) = (&self.calendar, &booking.calendar_event_id) {
            if let Err(e) = calendar.update_event(event_id, &booking).await {
                warn!(booking_id = %booking.id, %event_id, error = %e, "calendar event not updated");
            }
        }
        for notifier in &self.notifiers {
            if let Err(e) = notifier.booking_rescheduled(&booking, previous_start).await {
                warn!(booking_id = %booking.id, channel = notifier.channel(), error = %e, "reschedule notice not delivered");
            }
        }
        Ok(booking)
    }

    /// Cancel a booking, freeing its time.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> Result<Booking> {
        let staff_id = self.load_booking(id).await?.staff_id;
        let lock = self.locks.for_staff(&staff_id);
        let booking = {
            let _guard = lock.lock().await;
            let mut booking = self.load_booking(id).await?;
            if !booking.status.is_active() {
                return Err(BookingError::AlreadyTerminal(id));
            }
            booking.status = BookingStatus::Cancelled;
            self.store.update(&booking).await?;
            booking
        };
        info!(booking_id = %booking.id, "booking cancelled");

        if let (Some(calendar), Some(event_id)) = (&self.calendar, &booking.calendar_event_id) {
            if let Err(e) = calendar.delete_event(event_id).await {
                warn!(booking_id = %booking.id, %event_id, error = %e, "calendar event not deleted");
            }
        }
        for notifier in &self.notifiers {
            if let Err(e) = notifier.booking_cancelled(&booking).await {
                warn!(booking_id = %booking.id, channel = notifier.channel(), error = %e, "cancellation notice not delivered");
            }
        }
        Ok(booking)
    }

    /// Run every check for placing `duration` minutes at `date time` and
    /// return the UTC range to store.
    #[allow(clippy::too_many_arguments)]
    async fn validate_slot(
        &self,
        staff: &StaffProfile,
        tz: &Tz,
        date: NaiveDate,
        time: WallClock,
        duration: u32,
        exclude: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if duration == 0 || i64::from(duration) > MAX_OPTION_MINUTES {
            return Err(BookingError::Configuration(format!(
                "appointment length must be between 1 and {MAX_OPTION_MINUTES} minutes, got {duration}"
            )));
        }
        let plan = staff.schedule.working_windows(date);
        if !plan.is_open() {
            return Err(BookingError::Unavailable {
                date,
                reason: UnavailableReason::from_source(plan.source),
            });
        }
        if !plan.contains(time, duration) {
            return Err(BookingError::OutOfSchedule { date, time });
        }

        let existing = self.active_bookings_near(staff, date, exclude).await?;
        if staff.daily_limit.is_reached(count_on(&existing, date)) {
            return Err(BookingError::Unavailable {
                date,
                reason: UnavailableReason::DailyLimitReached,
            });
        }

        let start = self
            .policy
            .dst_policy
            .to_utc(date, time.hour(), time.minute(), &staff.timezone)?;
        let end = start + Duration::minutes(i64::from(duration));
        let candidate = TimeRange { start, end };
        if let Some(clash) = existing.iter().find(|b| b.range().overlaps(&candidate)) {
            debug!(existing = %clash.id, "requested time overlaps");
            return Err(BookingError::Conflict {
                existing: Some(clash.id),
            });
        }

        let local_now = utc_to_local_reference(now, tz);
        let today = local_now.date_naive();
        let now_minutes = local_now.hour() * 60 + local_now.minute();
        if date < today || (date == today && time.minutes() <= now_minutes) {
            return Err(BookingError::PastTime { date, time });
        }

        Ok((start, end))
    }

    /// Active bookings of `staff` within `search_band_days` of `date`.
    async fn active_bookings_near(
        &self,
        staff: &StaffProfile,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>> {
        let band = Duration::days(self.policy.search_band_days);
        let from = reference_midnight(date) - band;
        let to = reference_midnight(date) + Duration::days(1) + band;
        let mut bookings = self
            .store
            .bookings_between(&staff.id, from, to, exclude)
            .await?;
        bookings.retain(|b| b.status.is_active());
        Ok(bookings)
    }

    /// Mirror a new booking into the calendar and record the event id on
    /// the stored booking as it is now, not as it was at creation.
    async fn link_calendar_event(&self, booking: Booking) -> Booking {
        let Some(calendar) = &self.calendar else {
            return booking;
        };
        let event_id = match calendar.create_event(&booking).await {
            Ok(event_id) => event_id,
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "calendar event not created");
                return booking;
            }
        };

        let created_start = booking.start_time_utc;
        let lock = self.locks.for_staff(&booking.staff_id);
        let _guard = lock.lock().await;
        let mut latest = match self.store.booking(booking.id).await {
            Ok(Some(latest)) => latest,
            Ok(None) => booking,
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "calendar event id not saved");
                return booking;
            }
        };
        if !latest.status.is_active() {
            // Cancelled while the event was being created; nothing left to mirror.
            if let Err(e) = calendar.delete_event(&event_id).await {
                warn!(booking_id = %latest.id, %event_id, error = %e, "calendar event not deleted");
            }
            return latest;
        }
        if latest.start_time_utc != created_start {
            // Rescheduled while the event was being created.
            if let Err(e) = calendar.update_event(&event_id, &latest).await {
                warn!(booking_id = %latest.id, %event_id, error = %e, "calendar event not updated");
            }
        }
        latest.calendar_event_id = Some(event_id);
        if let Err(e) = self.store.update(&latest).await {
            warn!(booking_id = %latest.id, error = %e, "calendar event id not saved");
        }
        latest
    }

    async fn load_staff(&self, staff_id: &str) -> Result<StaffProfile> {
        self.store
            .staff(staff_id)
            .await?
            .ok_or_else(|| BookingError::not_found("staff", staff_id))
    }

    async fn load_service(&self, service_id: &str) -> Result<ServiceOffering> {
        self.store
            .service(service_id)
            .await?
            .ok_or_else(|| BookingError::not_found("service", service_id))
    }

    async fn load_booking(&self, id: Uuid) -> Result<Booking> {
        self.store
            .booking(id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", id))
    }
}

/// The earliest start offered on the reference axis: `lead_minutes` after
/// `local_now` rounded up to a whole minute, and never inside the current
/// minute, which booking treats as past.
fn earliest_offer(local_now: DateTime<Utc>, lead_minutes: i64) -> DateTime<Utc> {
    let minute = Duration::minutes(1);
    let current_minute = local_now.duration_trunc(minute).unwrap_or(local_now);
    let with_lead = align_up(local_now + Duration::minutes(lead_minutes), Some(1));
    with_lead.max(current_minute + minute)
}

fn count_on(bookings: &[Booking], date: NaiveDate) -> usize {
    bookings.iter().filter(|b| b.date == date).count()
}

fn duplicate_as_conflict(err: StoreError) -> BookingError {
    match err {
        StoreError::Duplicate { .. } => BookingError::Conflict { existing: None },
        other => BookingError::Store(other),
    }
}
