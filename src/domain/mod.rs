//! Domain layer: entities, lifecycle rules and repository interfaces

pub mod booking;
pub mod location;
pub mod recognition;
pub mod repositories;
pub mod user;
pub mod vehicle;
pub mod wallet;

pub use booking::{Booking, BookingKind, BookingRequest, BookingStatus, NewBooking};
pub use location::{ParkingLocation, Slot, SlotType};
pub use recognition::{PlateDetection, PlateRecognizer};
pub use repositories::{DomainResult, RepositoryProvider};
pub use user::{User, UserRole, UserStatus};
pub use vehicle::Vehicle;
pub use wallet::{TransactionType, Wallet, WalletTransaction};

pub use crate::shared::errors::DomainError;
