//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{Booking, StatusChange};
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Error for a write that would give a vehicle a second active booking
pub fn vehicle_already_active(vehicle_id: Uuid) -> DomainError {
    DomainError::Conflict(format!("vehicle {vehicle_id} already has an active booking"))
}

/// Booking storage. A vehicle holds at most one `active` booking; inserts and
/// transitions that would break this fail with `vehicle_already_active`
/// atomically with the write.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>>;

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>>;

    /// All bookings of a user, newest first
    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Booking>>;

    /// Pending or active bookings of a vehicle, oldest first
    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>>;

    /// Pending pre-booked reservation of `vehicle_id` at `location_id`
    /// whose window contains `at`
    async fn find_reservation_at(
        &self,
        vehicle_id: Uuid,
        location_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Booking>>;

    /// Open bookings on `spot_number` that overlap `[start, end)` or start
    /// exactly at `start`, ordered by creation
    async fn find_range_conflicts(
        &self,
        spot_number: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>>;

    /// Open bookings on `spot_number` holding the slot at `at`, ordered by
    /// creation
    async fn find_current_holders(
        &self,
        spot_number: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>>;

    /// Apply `change` only if the stored status still equals `change.from`.
    /// Returns the updated booking, or `None` if the status had moved on.
    async fn transition(&self, id: Uuid, change: StatusChange) -> DomainResult<Option<Booking>>;
}
