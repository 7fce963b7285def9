//! Parking location aggregate
//!
//! Contains the ParkingLocation entity, its slots, DTOs, and repository interface.

pub mod dto;
pub mod model;
pub mod repository;

pub use dto::{CreateLocationDto, SlotDto, UpdateLocationDto};
pub use model::{ParkingLocation, Slot, SlotType};
pub use repository::LocationRepository;
