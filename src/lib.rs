//! # ParkGate Reservation & Settlement Engine
//!
//! Slot allocation, booking lifecycle, wallet ledger and the gate workflow
//! that ties them together when a vehicle arrives or leaves.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Entities, lifecycle rules and repository traits
//! - **application**: Services (wallet, allocator, bookings, gate) and the event bus
//! - **infrastructure**: In-memory and SeaORM repositories, plate readers
//! - **config** / **logging**: TOML configuration and tracing setup

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod shared;

pub use application::{create_event_bus, Engine, EngineEvent, EventBus, SharedEventBus};
pub use config::{default_config_path, AppConfig};
pub use logging::init_tracing;

// Re-export storage backends for easy access
pub use infrastructure::{
    init_database, run_migrations, DatabaseConfig, InMemoryRepositoryProvider,
    ManualPlateReader, SeaOrmRepositoryProvider,
};
