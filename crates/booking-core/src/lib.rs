//! # booking-core
//!
//! The booking transaction built on [`slot_engine`]: list bookable times,
//! create, reschedule and cancel appointments.
//!
//! Persistence and outbound side effects (calendar mirroring, SMS/email) are
//! behind async traits in [`ports`]. Side-effect failures are logged and never
//! fail a booking operation.
//!
//! ## Modules
//!
//! - [`service`]: `BookingService` and its validation sequence
//! - [`policy`]: `BookingPolicy` configuration document
//! - [`model`]: Bookings, staff profiles, services, requests
//! - [`ports`]: `BookingStore`, `CalendarSync`, `Notifier`
//! - [`memory`]: `InMemoryStore`
//! - [`error`]: Error types

pub mod error;
pub mod memory;
pub mod model;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::{BookingError, SideEffectError, StoreError, UnavailableReason};
pub use memory::InMemoryStore;
pub use model::{Booking, BookingRequest, BookingStatus, Customer, ServiceOffering, StaffProfile};
pub use policy::BookingPolicy;
pub use ports::{BookingStore, CalendarSync, Notifier};
pub use service::BookingService;
