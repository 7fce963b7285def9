//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::location::LocationRepository;
use super::user::UserRepository;
use super::vehicle::VehicleRepository;
use super::wallet::WalletRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let vehicle = repos.vehicles().find_by_plate("CAB1234").await?;
///     let open = repos.bookings().find_open_by_vehicle(vehicle_id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn locations(&self) -> &dyn LocationRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn wallets(&self) -> &dyn WalletRepository;
    fn vehicles(&self) -> &dyn VehicleRepository;
    fn users(&self) -> &dyn UserRepository;
}
