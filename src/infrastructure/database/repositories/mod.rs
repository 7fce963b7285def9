//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

mod common;

pub mod booking_repository;
pub mod location_repository;
pub mod repository_provider;
pub mod user_repository;
pub mod vehicle_repository;
pub mod wallet_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
