//! Parking location repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::ParkingLocation;
use crate::domain::DomainResult;

#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Save a new location together with its slots
    async fn save(&self, location: ParkingLocation) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ParkingLocation>>;

    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>>;

    /// Replace name, address and slot catalog of an existing location
    async fn update(&self, location: ParkingLocation) -> DomainResult<()>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Atomically set `occupied = true` on a slot only if it is currently
    /// free. `Ok(false)` means another writer holds the slot.
    async fn claim_slot(&self, location_id: Uuid, number: &str) -> DomainResult<bool>;

    /// Unconditionally set the occupied flag of one slot
    async fn set_slot_occupied(
        &self,
        location_id: Uuid,
        number: &str,
        occupied: bool,
    ) -> DomainResult<()>;
}
