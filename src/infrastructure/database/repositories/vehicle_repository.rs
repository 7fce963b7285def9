use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{db_err, is_unique_violation};
use crate::domain::vehicle::VehicleRepository;
use crate::domain::{DomainError, DomainResult, Vehicle};
use crate::infrastructure::database::entities::vehicle;

pub struct SeaOrmVehicleRepository {
    db: DatabaseConnection,
}

impl SeaOrmVehicleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: vehicle::Model) -> Vehicle {
    Vehicle {
        id: m.id,
        plate_number: m.plate_number,
        brand: m.brand,
        model: m.model,
        owner_id: m.owner_id,
        created_at: m.created_at,
    }
}

#[async_trait]
impl VehicleRepository for SeaOrmVehicleRepository {
    async fn save(&self, v: Vehicle) -> DomainResult<()> {
        debug!("Saving vehicle: {} ({})", v.plate_number, v.id);

        let model = vehicle::ActiveModel {
            id: Set(v.id),
            plate_number: Set(v.plate_number.clone()),
            brand: Set(v.brand),
            model: Set(v.model),
            owner_id: Set(v.owner_id),
            created_at: Set(v.created_at),
        };
        match model.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(format!(
                "plate {} is already registered",
                v.plate_number
            ))),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>> {
        Ok(vehicle::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain))
    }

    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Vehicle>> {
        Ok(vehicle::Entity::find()
            .filter(vehicle::Column::PlateNumber.eq(plate_number))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Vehicle>> {
        Ok(vehicle::Entity::find()
            .filter(vehicle::Column::OwnerId.eq(owner_id))
            .order_by_asc(vehicle::Column::PlateNumber)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect())
    }
}
