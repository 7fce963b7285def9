//! Location catalog administration

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::allocation::SlotAllocator;
use crate::application::events::{EngineEvent, SharedEventBus, SlotEvent};
use crate::domain::location::{CreateLocationDto, SlotDto, UpdateLocationDto};
use crate::domain::{DomainResult, ParkingLocation, RepositoryProvider, Slot};
use crate::shared::errors::DomainError;

#[derive(Clone)]
pub struct LocationService {
    repos: Arc<dyn RepositoryProvider>,
    allocator: SlotAllocator,
    events: SharedEventBus,
}

impl LocationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        allocator: SlotAllocator,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            allocator,
            events,
        }
    }

    pub async fn create(&self, dto: CreateLocationDto) -> DomainResult<ParkingLocation> {
        dto.validate()?;
        let slots = build_slots(dto.slots)?;
        let location = ParkingLocation::new(dto.name.trim(), dto.address.trim(), slots);
        ensure_unique_slots(&location)?;

        self.repos.locations().save(location.clone()).await?;
        info!(
            location_id = %location.id,
            name = %location.name,
            total_slots = location.total_slots(),
            "Location created"
        );
        Ok(location)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<ParkingLocation> {
        self.repos
            .locations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Location", "id", id))
    }

    pub async fn list(&self) -> DomainResult<Vec<ParkingLocation>> {
        self.repos.locations().find_all().await
    }

    /// Apply a partial update. A new slot list replaces the old catalog;
    /// occupancy of slots that keep their number is carried over unless the
    /// update sets it.
    pub async fn update(&self, id: Uuid, dto: UpdateLocationDto) -> DomainResult<ParkingLocation> {
        dto.validate()?;
        let mut location = self.get(id).await?;

        if let Some(name) = dto.name {
            location.name = name.trim().to_string();
        }
        if let Some(address) = dto.address {
            location.address = address.trim().to_string();
        }
        if let Some(slot_dtos) = dto.slots {
            let mut slots = build_slots(slot_dtos)?;
            for slot in slots.iter_mut() {
                if let Some(previous) = location.get_slot(&slot.number) {
                    slot.occupied |= previous.occupied;
                }
            }
            location.slots = slots;
        }
        ensure_unique_slots(&location)?;
        location.updated_at = Utc::now();

        self.repos.locations().update(location.clone()).await?;
        info!(location_id = %id, total_slots = location.total_slots(), "Location updated");
        Ok(location)
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.get(id).await?;
        self.repos.locations().delete(id).await?;
        info!(location_id = %id, "Location deleted");
        Ok(())
    }

    /// Sensor-driven occupancy update for one slot
    pub async fn update_slot_status(
        &self,
        location_id: Uuid,
        number: &str,
        occupied: bool,
    ) -> DomainResult<()> {
        self.allocator
            .set_occupied(location_id, number, occupied)
            .await?;
        if !occupied {
            self.events.publish(EngineEvent::SlotReleased(SlotEvent {
                location_id,
                spot_number: number.to_string(),
                timestamp: Utc::now(),
            }));
        }
        Ok(())
    }
}

fn build_slots(dtos: Vec<SlotDto>) -> DomainResult<Vec<Slot>> {
    dtos.into_iter()
        .map(|dto| {
            dto.validate()?;
            let slot = Slot::from(dto);
            if slot.number.is_empty() {
                return Err(DomainError::Validation("slot number is required".into()));
            }
            Ok(slot)
        })
        .collect()
}

fn ensure_unique_slots(location: &ParkingLocation) -> DomainResult<()> {
    match location.duplicate_slot_number() {
        Some(number) => Err(DomainError::Conflict(format!(
            "slot number {number} appears more than once"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::domain::SlotType;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::errors::ErrorKind;
    use crate::shared::RetryConfig;

    fn service() -> LocationService {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let allocator = SlotAllocator::new(repos.clone(), RetryConfig::immediate(3));
        LocationService::new(repos, allocator, create_event_bus())
    }

    fn create_dto(numbers: &[&str]) -> CreateLocationDto {
        CreateLocationDto {
            name: "Central".into(),
            address: "1 Main St".into(),
            slots: numbers
                .iter()
                .map(|n| SlotDto::new(*n, SlotType::Standard))
                .collect(),
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let locations = service();
        let created = locations.create(create_dto(&["A1", "A2"])).await.unwrap();
        assert_eq!(created.total_slots(), 2);
        let all = locations.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, created.id);
    }

    #[tokio::test]
    async fn duplicate_slot_numbers_conflict() {
        let locations = service();
        let err = locations.create(create_dto(&["A1", "A1"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn empty_catalog_is_invalid() {
        let locations = service();
        let err = locations.create(create_dto(&[])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn update_keeps_occupancy_of_surviving_slots() {
        let locations = service();
        let created = locations.create(create_dto(&["A1", "A2"])).await.unwrap();
        locations.update_slot_status(created.id, "A2", true).await.unwrap();

        let updated = locations
            .update(
                created.id,
                UpdateLocationDto {
                    name: Some("Central North".into()),
                    slots: Some(vec![
                        SlotDto::new("A2", SlotType::Standard),
                        SlotDto::new("B1", SlotType::Electric),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Central North");
        assert_eq!(updated.address, "1 Main St");
        assert!(updated.get_slot("A2").unwrap().occupied);
        assert!(!updated.has_slot("A1"));

        let stored = locations.get(created.id).await.unwrap();
        assert_eq!(stored.slots, updated.slots);
    }

    #[tokio::test]
    async fn delete_removes_location() {
        let locations = service();
        let created = locations.create(create_dto(&["A1"])).await.unwrap();
        locations.delete(created.id).await.unwrap();
        let err = locations.get(created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(locations.delete(created.id).await.is_err());
    }

    #[tokio::test]
    async fn slot_status_for_unknown_slot_is_not_found() {
        let locations = service();
        let created = locations.create(create_dto(&["A1"])).await.unwrap();
        let err = locations
            .update_slot_status(created.id, "Q7", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
