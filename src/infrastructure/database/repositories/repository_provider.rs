//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::location::LocationRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::user::UserRepository;
use crate::domain::vehicle::VehicleRepository;
use crate::domain::wallet::WalletRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::location_repository::SeaOrmLocationRepository;
use super::user_repository::SeaOrmUserRepository;
use super::vehicle_repository::SeaOrmVehicleRepository;
use super::wallet_repository::SeaOrmWalletRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let location = repos.locations().find_by_id(location_id).await?;
/// let wallet = repos.wallets().find_by_user(user_id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    locations: SeaOrmLocationRepository,
    bookings: SeaOrmBookingRepository,
    wallets: SeaOrmWalletRepository,
    vehicles: SeaOrmVehicleRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            locations: SeaOrmLocationRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            wallets: SeaOrmWalletRepository::new(db.clone()),
            vehicles: SeaOrmVehicleRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        &self.locations
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn wallets(&self) -> &dyn WalletRepository {
        &self.wallets
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}
