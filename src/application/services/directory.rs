//! User and vehicle registration for operators

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::recognition::{is_valid_plate, normalize_plate};
use crate::domain::user::CreateUserDto;
use crate::domain::vehicle::RegisterVehicleDto;
use crate::domain::{DomainResult, RepositoryProvider, User, Vehicle};
use crate::shared::errors::DomainError;

#[derive(Clone)]
pub struct DirectoryService {
    repos: Arc<dyn RepositoryProvider>,
}

impl DirectoryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Register an account; the returned record is sanitized
    pub async fn register_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        dto.validate()?;
        let mut user = User::new(dto.name.trim(), dto.email);
        if let Some(role) = dto.role {
            user.role = role;
        }
        user.password_hash = dto.password_hash;

        self.repos.users().save(user.clone()).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user.sanitized())
    }

    pub async fn user(&self, id: Uuid) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .map(|u| u.sanitized())
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    pub async fn register_vehicle(&self, dto: RegisterVehicleDto) -> DomainResult<Vehicle> {
        dto.validate()?;
        let plate = normalize_plate(&dto.plate_number);
        if !is_valid_plate(&plate) {
            return Err(DomainError::Validation(format!(
                "invalid plate number {:?}",
                dto.plate_number
            )));
        }
        self.user(dto.owner_id).await?;

        let vehicle = Vehicle::new(&plate, dto.brand.trim(), dto.model.trim(), dto.owner_id);
        self.repos.vehicles().save(vehicle.clone()).await?;
        info!(vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn vehicle_by_plate(&self, plate: &str) -> DomainResult<Vehicle> {
        let plate = normalize_plate(plate);
        self.repos
            .vehicles()
            .find_by_plate(&plate)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "plate_number", plate))
    }

    pub async fn vehicles_of(&self, owner_id: Uuid) -> DomainResult<Vec<Vehicle>> {
        self.repos.vehicles().find_by_owner(owner_id).await
    }
}
