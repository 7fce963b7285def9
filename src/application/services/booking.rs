//! Booking lifecycle service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::allocation::SlotAllocator;
use super::billing::PricingPolicy;
use super::wallet::WalletService;
use crate::application::events::{BookingEvent, EngineEvent, SharedEventBus};
use crate::domain::booking::StatusChange;
use crate::domain::{
    Booking, BookingKind, BookingRequest, BookingStatus, DomainResult, NewBooking,
    ParkingLocation, RepositoryProvider, User, Vehicle,
};
use crate::shared::errors::DomainError;

/// Booking with its referenced records resolved for read paths. The user is
/// always sanitized.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub vehicle: Option<Vehicle>,
    pub user: Option<User>,
    pub location: Option<ParkingLocation>,
}

/// A completed booking and the status it was closed from
#[derive(Debug, Clone)]
pub struct Settlement {
    pub booking: Booking,
    pub previous: BookingStatus,
}

impl Settlement {
    /// Only an active booking had its car in the slot
    pub fn held_slot(&self) -> bool {
        self.previous == BookingStatus::Active
    }
}

/// Owns booking creation and every status transition.
///
/// Transitions are conditional writes on the expected prior status, so two
/// callers racing on the same booking cannot both win.
#[derive(Clone)]
pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    allocator: SlotAllocator,
    wallets: WalletService,
    policy: PricingPolicy,
    events: SharedEventBus,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        allocator: SlotAllocator,
        wallets: WalletService,
        policy: PricingPolicy,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            allocator,
            wallets,
            policy,
            events,
        }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub async fn create(&self, request: NewBooking) -> DomainResult<Booking> {
        self.create_at(request, Utc::now()).await
    }

    /// Create a booking as of `now`
    pub async fn create_at(&self, request: NewBooking, now: DateTime<Utc>) -> DomainResult<Booking> {
        let NewBooking {
            vehicle_id,
            user_id,
            location_id,
            request,
        } = request;

        self.ensure_reserve(user_id).await?;
        self.ensure_vehicle_owner(vehicle_id, user_id).await?;

        let booking = match request {
            BookingRequest::PreBooked {
                spot_number,
                start_time,
                end_time,
            } => {
                self.create_pre_booked(
                    Booking::pre_booked(
                        vehicle_id,
                        user_id,
                        location_id,
                        spot_number.trim(),
                        start_time,
                        end_time,
                        now,
                    ),
                    now,
                )
                .await?
            }
            BookingRequest::OnSite { start_time } => {
                self.create_on_site(vehicle_id, user_id, location_id, start_time.unwrap_or(now), now)
                    .await?
            }
        };

        info!(
            booking_id = %booking.id,
            kind = booking.kind.as_str(),
            spot = ?booking.spot_number,
            status = booking.status.as_str(),
            "Booking created"
        );
        self.events
            .publish(EngineEvent::BookingCreated(booking_event(&booking, now)));
        Ok(booking)
    }

    async fn create_pre_booked(&self, booking: Booking, now: DateTime<Utc>) -> DomainResult<Booking> {
        let spot = booking.spot_number.clone().unwrap_or_default();
        if spot.is_empty() {
            return Err(DomainError::Validation(
                "spot number is required for pre-booked parking".into(),
            ));
        }
        if booking.start_time < now {
            return Err(DomainError::Validation("booking start time is in the past".into()));
        }
        if let Some(end) = booking.end_time {
            if end <= booking.start_time {
                return Err(DomainError::Validation(
                    "end time must be after start time".into(),
                ));
            }
        }
        if !self
            .allocator
            .slot_exists_in_location(booking.location_id, &spot)
            .await?
        {
            return Err(DomainError::not_found("Slot", "number", &spot));
        }

        let available = match booking.end_time {
            Some(end) => self.allocator.is_range_available(&spot, booking.start_time, end).await?,
            None => self.allocator.is_currently_available(&spot, now).await?,
        };
        if !available {
            return Err(spot_taken());
        }

        self.repos.bookings().insert(booking.clone()).await?;

        // Two requests can both pass the availability read. Whichever checks
        // last sees the other and withdraws, so at most one keeps the window.
        if let Some(end) = booking.end_time {
            let rivals = self
                .repos
                .bookings()
                .find_range_conflicts(&spot, booking.start_time, end)
                .await?;
            if rivals.iter().any(|other| other.id != booking.id) {
                warn!(booking_id = %booking.id, spot = %spot, "Lost reservation race, withdrawing");
                self.repos
                    .bookings()
                    .transition(
                        booking.id,
                        StatusChange::new(BookingStatus::Pending, BookingStatus::Cancelled, now),
                    )
                    .await?;
                return Err(spot_taken());
            }
        }

        Ok(booking)
    }

    async fn create_on_site(
        &self,
        vehicle_id: Uuid,
        user_id: Uuid,
        location_id: Uuid,
        start_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let spot = self.allocator.claim_available_slot(location_id).await?;
        let booking = Booking::on_site(vehicle_id, user_id, location_id, &spot, start_time, now);

        if let Err(err) = self.repos.bookings().insert(booking.clone()).await {
            error!(location_id = %location_id, slot = %spot, error = %err, "Booking insert failed, releasing slot");
            if let Err(release_err) = self.allocator.set_occupied(location_id, &spot, false).await {
                error!(
                    location_id = %location_id,
                    slot = %spot,
                    error = %release_err,
                    "Slot release failed, needs manual reconciliation"
                );
            }
            return Err(err);
        }
        Ok(booking)
    }

    pub async fn cancel(&self, id: Uuid) -> DomainResult<Booking> {
        self.cancel_at(id, Utc::now()).await
    }

    pub async fn cancel_at(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Booking> {
        let booking = self.get(id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(not_pending());
        }
        let cancelled = self
            .apply(
                id,
                StatusChange::new(BookingStatus::Pending, BookingStatus::Cancelled, now),
                not_pending,
            )
            .await?;
        info!(booking_id = %id, "Booking cancelled");
        self.events
            .publish(EngineEvent::BookingCancelled(booking_event(&cancelled, now)));
        Ok(cancelled)
    }

    /// Vehicle arrived for its reservation
    pub async fn activate(&self, id: Uuid) -> DomainResult<Booking> {
        self.activate_at(id, Utc::now()).await
    }

    pub async fn activate_at(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Booking> {
        let booking = self.get(id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(not_pending());
        }
        let active = self
            .apply(
                id,
                StatusChange::new(BookingStatus::Pending, BookingStatus::Active, now),
                not_pending,
            )
            .await?;
        info!(booking_id = %id, spot = ?active.spot_number, "Booking activated");
        self.events
            .publish(EngineEvent::BookingActivated(booking_event(&active, now)));
        Ok(active)
    }

    /// Close an active on-site booking
    pub async fn complete_on_site(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_amount: i64,
    ) -> DomainResult<Booking> {
        self.complete_on_site_at(id, end_time, total_amount, Utc::now())
            .await
    }

    pub async fn complete_on_site_at(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_amount: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let booking = self.get(id).await?;
        if booking.kind != BookingKind::OnSite {
            return Err(DomainError::Conflict(format!(
                "booking {id} is {}, not on_site",
                booking.kind
            )));
        }
        if booking.status != BookingStatus::Active {
            return Err(DomainError::Conflict(format!("booking {id} is not active")));
        }
        self.complete(booking, end_time, total_amount, now).await
    }

    /// Close a paid booking of either kind from pending or active
    pub async fn settle(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_amount: i64,
    ) -> DomainResult<Settlement> {
        self.settle_at(id, end_time, total_amount, Utc::now()).await
    }

    pub async fn settle_at(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_amount: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Settlement> {
        let booking = self.get(id).await?;
        if !booking.is_open() {
            return Err(DomainError::Conflict(format!("booking {id} is already closed")));
        }
        let previous = booking.status;
        let booking = self.complete(booking, end_time, total_amount, now).await?;
        Ok(Settlement { booking, previous })
    }

    async fn complete(
        &self,
        booking: Booking,
        end_time: DateTime<Utc>,
        total_amount: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        if total_amount < 0 {
            return Err(DomainError::Validation("total amount cannot be negative".into()));
        }
        let completed = self
            .apply(
                booking.id,
                StatusChange::completing(booking.status, end_time, total_amount, now),
                || DomainError::Conflict(format!("booking {} was closed concurrently", booking.id)),
            )
            .await?;
        info!(booking_id = %completed.id, total_amount, "Booking completed");
        self.events
            .publish(EngineEvent::BookingCompleted(booking_event(&completed, now)));
        Ok(completed)
    }

    async fn apply(
        &self,
        id: Uuid,
        change: StatusChange,
        lost: impl FnOnce() -> DomainError,
    ) -> DomainResult<Booking> {
        debug_assert!(change.from.can_transition_to(change.to));
        self.repos
            .bookings()
            .transition(id, change)
            .await?
            .ok_or_else(lost)
    }

    // ── Reads ─────────────────────────────────────────────────

    pub async fn get(&self, id: Uuid) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", id))
    }

    pub async fn get_details(&self, id: Uuid) -> DomainResult<BookingDetails> {
        let booking = self.get(id).await?;
        self.hydrate(booking).await
    }

    pub async fn by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_by_vehicle(vehicle_id).await
    }

    /// Bookings of a user, newest first, with references resolved
    pub async fn by_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        let bookings = self.repos.bookings().find_by_user(user_id).await?;
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            details.push(self.hydrate(booking).await?);
        }
        Ok(details)
    }

    /// Pending or active bookings of a vehicle, oldest first
    pub async fn open_for_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_open_by_vehicle(vehicle_id).await
    }

    /// Pending reservation at `location_id` whose window contains `at`
    pub async fn reservation_at(
        &self,
        vehicle_id: Uuid,
        location_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Booking>> {
        self.repos
            .bookings()
            .find_reservation_at(vehicle_id, location_id, at)
            .await
    }

    async fn hydrate(&self, booking: Booking) -> DomainResult<BookingDetails> {
        let vehicle = self.repos.vehicles().find_by_id(booking.vehicle_id).await?;
        let user = self
            .repos
            .users()
            .find_by_id(booking.user_id)
            .await?
            .map(|u| u.sanitized());
        let location = self.repos.locations().find_by_id(booking.location_id).await?;
        Ok(BookingDetails {
            booking,
            vehicle,
            user,
            location,
        })
    }

    // ── Preconditions ─────────────────────────────────────────

    async fn ensure_reserve(&self, user_id: Uuid) -> DomainResult<()> {
        let balance = self.wallets.balance(user_id).await?;
        if balance < self.policy.reserve_minimum {
            return Err(DomainError::InsufficientFunds {
                required: self.policy.reserve_minimum,
                available: balance,
            });
        }
        Ok(())
    }

    async fn ensure_vehicle_owner(&self, vehicle_id: Uuid, user_id: Uuid) -> DomainResult<()> {
        let vehicle = self
            .repos
            .vehicles()
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", vehicle_id))?;
        if !vehicle.is_owned_by(user_id) {
            return Err(DomainError::Validation(format!(
                "vehicle {} does not belong to user {user_id}",
                vehicle.plate_number
            )));
        }
        Ok(())
    }
}

fn booking_event(booking: &Booking, at: DateTime<Utc>) -> BookingEvent {
    BookingEvent {
        booking_id: booking.id,
        vehicle_id: booking.vehicle_id,
        location_id: booking.location_id,
        spot_number: booking.spot_number.clone(),
        timestamp: at,
    }
}

fn spot_taken() -> DomainError {
    DomainError::Conflict("parking spot already booked for this time".into())
}

fn not_pending() -> DomainError {
    DomainError::Conflict("booking is not pending".into())
}
