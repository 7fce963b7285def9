//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use parkgate::application::services::PricingPolicy;
use parkgate::domain::location::{CreateLocationDto, SlotDto};
use parkgate::domain::user::CreateUserDto;
use parkgate::domain::vehicle::RegisterVehicleDto;
use parkgate::domain::{ParkingLocation, RepositoryProvider, SlotType, User, Vehicle};
use parkgate::shared::RetryConfig;
use parkgate::{
    init_database, run_migrations, DatabaseConfig, Engine, InMemoryRepositoryProvider,
    ManualPlateReader, SeaOrmRepositoryProvider,
};

pub struct Fixture {
    pub engine: Engine,
    pub repos: Arc<dyn RepositoryProvider>,
}

pub struct Driver {
    pub user: User,
    pub vehicle: Vehicle,
}

impl Fixture {
    pub fn memory() -> Self {
        Self::with_repos(Arc::new(InMemoryRepositoryProvider::new()))
    }

    pub async fn sqlite() -> Self {
        let db = init_database(&DatabaseConfig::memory())
            .await
            .expect("connect sqlite");
        run_migrations(&db).await.expect("migrate");
        Self::with_repos(Arc::new(SeaOrmRepositoryProvider::new(db)))
    }

    pub fn with_repos(repos: Arc<dyn RepositoryProvider>) -> Self {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay: std::time::Duration::from_millis(1),
            ..RetryConfig::default()
        };
        let engine = Engine::with_settings(
            repos.clone(),
            Arc::new(ManualPlateReader),
            PricingPolicy::default(),
            retry,
        );
        Self { engine, repos }
    }

    /// Location whose slots are given as (number, occupied)
    pub async fn location(&self, slots: &[(&str, bool)]) -> ParkingLocation {
        let slots = slots
            .iter()
            .map(|(number, occupied)| SlotDto {
                number: number.to_string(),
                slot_type: SlotType::Standard,
                occupied: *occupied,
            })
            .collect();
        self.engine
            .locations
            .create(CreateLocationDto {
                name: "Central".into(),
                address: "1 Main Street".into(),
                slots,
            })
            .await
            .expect("create location")
    }

    /// Registered user owning one vehicle, wallet topped up to `balance`
    pub async fn driver(&self, plate: &str, balance: i64) -> Driver {
        let user = self
            .engine
            .directory
            .register_user(CreateUserDto {
                name: "Driver".into(),
                email: format!("{}@example.com", Uuid::new_v4()),
                role: None,
                password_hash: Some("hash".into()),
            })
            .await
            .expect("register user");
        let vehicle = self
            .engine
            .directory
            .register_vehicle(RegisterVehicleDto {
                plate_number: plate.into(),
                brand: "Toyota".into(),
                model: "Aqua".into(),
                owner_id: user.id,
            })
            .await
            .expect("register vehicle");
        if balance > 0 {
            self.engine
                .wallets
                .top_up(user.id, balance)
                .await
                .expect("top up");
        }
        Driver { user, vehicle }
    }

    pub async fn slot_occupied(&self, location_id: Uuid, number: &str) -> bool {
        self.engine
            .locations
            .get(location_id)
            .await
            .expect("location")
            .slots
            .iter()
            .find(|s| s.number == number)
            .map(|s| s.occupied)
            .expect("slot")
    }
}

/// Fixed instant on a far-future day, at `hour:minute` UTC
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, 5, 20, hour, minute, 0)
        .single()
        .expect("valid time")
}
