//! Slot allocation and overlap detection

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{DomainResult, ParkingLocation, RepositoryProvider};
use crate::shared::errors::DomainError;
use crate::shared::{retry_with_backoff, RetryConfig};

/// Finds free slots and proves time windows free of conflicts.
///
/// Slot numbers are compared across all locations when checking booking
/// windows.
#[derive(Clone)]
pub struct SlotAllocator {
    repos: Arc<dyn RepositoryProvider>,
    claim_retry: RetryConfig,
}

impl SlotAllocator {
    pub fn new(repos: Arc<dyn RepositoryProvider>, claim_retry: RetryConfig) -> Self {
        Self { repos, claim_retry }
    }

    /// First unoccupied slot in stored order
    pub async fn find_available_slot(&self, location_id: Uuid) -> DomainResult<String> {
        let location = self.location(location_id).await?;
        location
            .first_free_slot()
            .map(|slot| slot.number.clone())
            .ok_or_else(|| no_slots(location_id))
    }

    pub async fn slot_exists_in_location(
        &self,
        location_id: Uuid,
        number: &str,
    ) -> DomainResult<bool> {
        Ok(self.location(location_id).await?.has_slot(number))
    }

    /// No open booking on `spot_number` overlaps `[start, end)` or starts at
    /// exactly `start`
    pub async fn is_range_available(
        &self,
        spot_number: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let conflicts = self
            .repos
            .bookings()
            .find_range_conflicts(spot_number, start, end)
            .await?;
        debug!(spot_number, conflicts = conflicts.len(), "Range availability checked");
        Ok(conflicts.is_empty())
    }

    /// No open booking holds `spot_number` at `now`
    pub async fn is_currently_available(
        &self,
        spot_number: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let holders = self
            .repos
            .bookings()
            .find_current_holders(spot_number, now)
            .await?;
        Ok(holders.is_empty())
    }

    pub async fn set_occupied(
        &self,
        location_id: Uuid,
        number: &str,
        occupied: bool,
    ) -> DomainResult<()> {
        self.repos
            .locations()
            .set_slot_occupied(location_id, number, occupied)
            .await?;
        debug!(location_id = %location_id, slot = number, occupied, "Slot occupancy updated");
        Ok(())
    }

    /// Find a free slot and mark it occupied with a conditional write.
    /// A claim lost to a concurrent writer is retried against a fresh read;
    /// exhausting the attempts reports the location as full.
    pub async fn claim_available_slot(&self, location_id: Uuid) -> DomainResult<String> {
        let claimed = retry_with_backoff(
            self.claim_retry.clone(),
            || self.try_claim(location_id),
            |err| matches!(err, DomainError::ClaimLost(_)),
            "claim_slot",
        )
        .await;

        match claimed {
            Ok(number) => {
                info!(location_id = %location_id, slot = %number, "Slot claimed");
                Ok(number)
            }
            Err(DomainError::ClaimLost(_)) => Err(no_slots(location_id)),
            Err(err) => Err(err),
        }
    }

    async fn try_claim(&self, location_id: Uuid) -> DomainResult<String> {
        let number = self.find_available_slot(location_id).await?;
        if self.repos.locations().claim_slot(location_id, &number).await? {
            Ok(number)
        } else {
            counter!("parkgate_slot_claim_conflicts_total").increment(1);
            debug!(location_id = %location_id, slot = %number, "Slot claim lost");
            Err(DomainError::ClaimLost(number))
        }
    }

    async fn location(&self, location_id: Uuid) -> DomainResult<ParkingLocation> {
        self.repos
            .locations()
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Location", "id", location_id))
    }
}

fn no_slots(location_id: Uuid) -> DomainError {
    DomainError::Unavailable(format!("no available slots at location {location_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Slot, SlotType};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::errors::ErrorKind;

    async fn setup(slots: Vec<Slot>) -> (SlotAllocator, Uuid) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let location = ParkingLocation::new("Central", "1 Main St", slots);
        let id = location.id;
        repos.locations().save(location).await.unwrap();
        (SlotAllocator::new(repos, RetryConfig::immediate(3)), id)
    }

    #[tokio::test]
    async fn finds_first_free_slot() {
        let (allocator, id) = setup(vec![
            Slot::new("A1", SlotType::Standard).occupied(),
            Slot::new("A2", SlotType::Standard),
            Slot::new("A3", SlotType::Standard),
        ])
        .await;
        assert_eq!(allocator.find_available_slot(id).await.unwrap(), "A2");
    }

    #[tokio::test]
    async fn full_location_is_unavailable() {
        let (allocator, id) = setup(vec![Slot::new("A1", SlotType::Standard).occupied()]).await;
        let err = allocator.claim_available_slot(id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let (allocator, _) = setup(vec![]).await;
        let err = allocator.find_available_slot(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn claim_marks_slot_occupied() {
        let (allocator, id) = setup(vec![
            Slot::new("A1", SlotType::Standard),
            Slot::new("A2", SlotType::Standard),
        ])
        .await;
        assert_eq!(allocator.claim_available_slot(id).await.unwrap(), "A1");
        assert_eq!(allocator.claim_available_slot(id).await.unwrap(), "A2");
        assert!(allocator.claim_available_slot(id).await.is_err());
    }

    #[tokio::test]
    async fn set_occupied_reports_missing_slot() {
        let (allocator, id) = setup(vec![Slot::new("A1", SlotType::Standard)]).await;
        allocator.set_occupied(id, "A1", true).await.unwrap();
        assert!(allocator.find_available_slot(id).await.is_err());

        let err = allocator.set_occupied(id, "Z9", true).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Slot", .. }));
    }

    #[tokio::test]
    async fn slot_membership() {
        let (allocator, id) = setup(vec![Slot::new("A1", SlotType::Standard)]).await;
        assert!(allocator.slot_exists_in_location(id, "A1").await.unwrap());
        assert!(!allocator.slot_exists_in_location(id, "A2").await.unwrap());
    }
}
