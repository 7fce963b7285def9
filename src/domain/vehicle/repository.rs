use async_trait::async_trait;
use uuid::Uuid;

use super::Vehicle;
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// `Conflict` if the plate is already registered
    async fn save(&self, vehicle: Vehicle) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>>;

    /// Lookup by normalised plate
    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Vehicle>>;

    async fn find_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Vehicle>>;
}
