//! SeaORM implementation of LocationRepository

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::common::db_err;
use crate::domain::location::LocationRepository;
use crate::domain::{DomainError, DomainResult, ParkingLocation, Slot, SlotType};
use crate::infrastructure::database::entities::{parking_location, parking_slot};

pub struct SeaOrmLocationRepository {
    db: DatabaseConnection,
}

impl SeaOrmLocationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_slots<C: ConnectionTrait>(
        conn: &C,
        location_id: Uuid,
        slots: &[Slot],
    ) -> DomainResult<()> {
        if slots.is_empty() {
            return Ok(());
        }
        let rows = slots
            .iter()
            .enumerate()
            .map(|(position, slot)| parking_slot::ActiveModel {
                location_id: Set(location_id),
                number: Set(slot.number.clone()),
                occupied: Set(slot.occupied),
                slot_type: Set(slot.slot_type.as_str().to_string()),
                position: Set(position as i32),
            });
        parking_slot::Entity::insert_many(rows)
            .exec_without_returning(conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn location_exists(&self, id: Uuid) -> DomainResult<bool> {
        Ok(parking_location::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_some())
    }

    /// NotFound for whichever of location or slot is missing
    async fn missing(&self, location_id: Uuid, number: &str) -> DomainError {
        match self.location_exists(location_id).await {
            Ok(true) => DomainError::not_found("Slot", "number", number),
            Ok(false) => DomainError::not_found("Location", "id", location_id),
            Err(e) => e,
        }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn slot_from_model(m: parking_slot::Model) -> Slot {
    Slot {
        number: m.number,
        occupied: m.occupied,
        slot_type: SlotType::from_str(&m.slot_type),
    }
}

fn model_to_domain(m: parking_location::Model, slots: Vec<parking_slot::Model>) -> ParkingLocation {
    ParkingLocation {
        id: m.id,
        name: m.name,
        address: m.address,
        slots: slots.into_iter().map(slot_from_model).collect(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn active_model(l: &ParkingLocation) -> parking_location::ActiveModel {
    parking_location::ActiveModel {
        id: Set(l.id),
        name: Set(l.name.clone()),
        address: Set(l.address.clone()),
        created_at: Set(l.created_at),
        updated_at: Set(l.updated_at),
    }
}

// ── LocationRepository impl ─────────────────────────────────────

#[async_trait]
impl LocationRepository for SeaOrmLocationRepository {
    async fn save(&self, location: ParkingLocation) -> DomainResult<()> {
        debug!("Saving location: {} ({} slots)", location.id, location.slots.len());

        let txn = self.db.begin().await.map_err(db_err)?;
        active_model(&location).insert(&txn).await.map_err(db_err)?;
        Self::insert_slots(&txn, location.id, &location.slots).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ParkingLocation>> {
        let Some(model) = parking_location::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let slots = parking_slot::Entity::find()
            .filter(parking_slot::Column::LocationId.eq(id))
            .order_by_asc(parking_slot::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(Some(model_to_domain(model, slots)))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>> {
        let models = parking_location::Entity::find()
            .order_by_asc(parking_location::Column::CreatedAt)
            .order_by_asc(parking_location::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut slots_by_location: HashMap<Uuid, Vec<parking_slot::Model>> = HashMap::new();
        for slot in parking_slot::Entity::find()
            .order_by_asc(parking_slot::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            slots_by_location.entry(slot.location_id).or_default().push(slot);
        }

        Ok(models
            .into_iter()
            .map(|m| {
                let slots = slots_by_location.remove(&m.id).unwrap_or_default();
                model_to_domain(m, slots)
            })
            .collect())
    }

    async fn update(&self, location: ParkingLocation) -> DomainResult<()> {
        debug!("Updating location: {}", location.id);

        if !self.location_exists(location.id).await? {
            return Err(DomainError::not_found("Location", "id", location.id));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        active_model(&location).update(&txn).await.map_err(db_err)?;
        parking_slot::Entity::delete_many()
            .filter(parking_slot::Column::LocationId.eq(location.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Self::insert_slots(&txn, location.id, &location.slots).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        debug!("Deleting location: {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;
        parking_slot::Entity::delete_many()
            .filter(parking_slot::Column::LocationId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = parking_location::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Location", "id", id));
        }
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn claim_slot(&self, location_id: Uuid, number: &str) -> DomainResult<bool> {
        let result = parking_slot::Entity::update_many()
            .col_expr(parking_slot::Column::Occupied, Expr::value(true))
            .filter(parking_slot::Column::LocationId.eq(location_id))
            .filter(parking_slot::Column::Number.eq(number))
            .filter(parking_slot::Column::Occupied.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            debug!("Claimed slot {} at {}", number, location_id);
            return Ok(true);
        }

        let slot = parking_slot::Entity::find_by_id((location_id, number.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        match slot {
            Some(_) => Ok(false),
            None => Err(self.missing(location_id, number).await),
        }
    }

    async fn set_slot_occupied(
        &self,
        location_id: Uuid,
        number: &str,
        occupied: bool,
    ) -> DomainResult<()> {
        let result = parking_slot::Entity::update_many()
            .col_expr(parking_slot::Column::Occupied, Expr::value(occupied))
            .filter(parking_slot::Column::LocationId.eq(location_id))
            .filter(parking_slot::Column::Number.eq(number))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(self.missing(location_id, number).await);
        }
        Ok(())
    }
}
