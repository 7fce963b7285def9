//! Booking aggregate
//!
//! Booking entity, lifecycle rules and repository interface.

pub mod model;
pub mod repository;

pub use model::{Booking, BookingKind, BookingRequest, BookingStatus, NewBooking, StatusChange};
pub use repository::{vehicle_already_active, BookingRepository};
