//! Gate workflow: vehicle arrivals and departures
//!
//! Sequences plate resolution, booking lookup or creation, slot occupancy
//! and payment. Steps are committed one by one with no rollback: a failure
//! part way leaves earlier steps in place and is logged with the booking id
//! for reconciliation. Payment is always taken before the booking is closed
//! and the slot freed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::allocation::SlotAllocator;
use super::billing::PricingPolicy;
use super::booking::BookingService;
use super::wallet::WalletService;
use crate::application::events::{
    EngineEvent, PaymentDeclinedEvent, PaymentEvent, SharedEventBus, SlotEvent,
};
use crate::domain::recognition::{is_valid_plate, normalize_plate};
use crate::domain::{
    Booking, BookingRequest, BookingStatus, DomainResult, NewBooking, PlateRecognizer,
    RepositoryProvider, User, Vehicle, WalletTransaction,
};
use crate::shared::errors::DomainError;

/// Outcome of a successful gate entry
#[derive(Debug, Clone, Serialize)]
pub struct GateEntry {
    pub plate: String,
    pub confidence: f64,
    pub vehicle: Vehicle,
    /// Sanitized owner record
    pub owner: User,
    pub booking: Booking,
    /// The vehicle arrived for a reservation rather than getting a new slot
    pub reused_reservation: bool,
}

/// Outcome of a successful gate exit
#[derive(Debug, Clone, Serialize)]
pub struct GateExit {
    pub plate: String,
    pub booking: Booking,
    pub transaction: WalletTransaction,
    pub billed_hours: i64,
    pub amount: i64,
}

struct Identified {
    plate: String,
    confidence: f64,
    vehicle: Vehicle,
}

#[derive(Clone)]
pub struct GateService {
    repos: Arc<dyn RepositoryProvider>,
    recognizer: Arc<dyn PlateRecognizer>,
    bookings: BookingService,
    wallets: WalletService,
    allocator: SlotAllocator,
    policy: PricingPolicy,
    events: SharedEventBus,
}

impl GateService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        recognizer: Arc<dyn PlateRecognizer>,
        bookings: BookingService,
        wallets: WalletService,
        allocator: SlotAllocator,
        policy: PricingPolicy,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            recognizer,
            bookings,
            wallets,
            allocator,
            policy,
            events,
        }
    }

    pub async fn enter(&self, location_id: Uuid, image: &[u8]) -> DomainResult<GateEntry> {
        self.enter_at(location_id, image, Utc::now()).await
    }

    pub async fn enter_at(
        &self,
        location_id: Uuid,
        image: &[u8],
        now: DateTime<Utc>,
    ) -> DomainResult<GateEntry> {
        let Identified {
            plate,
            confidence,
            vehicle,
        } = self.identify(image).await?;

        // A reservation for this gate is the one open booking allowed through
        let reservation = self
            .bookings
            .reservation_at(vehicle.id, location_id, now)
            .await?;
        let open = self.bookings.open_for_vehicle(vehicle.id).await?;
        let blocking = open
            .iter()
            .find(|b| reservation.as_ref().map_or(true, |r| r.id != b.id));
        if let Some(existing) = blocking {
            warn!(
                plate = %plate,
                booking_id = %existing.id,
                status = existing.status.as_str(),
                "Entry refused, vehicle already has an open booking"
            );
            return Err(DomainError::Conflict(
                "vehicle already has an active booking".into(),
            ));
        }

        let owner = self.owner_of(&vehicle).await?;

        let (booking, reused_reservation) = match reservation {
            Some(reserved) => {
                let active = self.bookings.activate_at(reserved.id, now).await?;
                if let Some(spot) = active.spot_number.as_deref() {
                    if let Err(err) = self
                        .allocator
                        .set_occupied(active.location_id, spot, true)
                        .await
                    {
                        error!(
                            booking_id = %active.id,
                            slot = spot,
                            step = "occupy_slot",
                            error = %err,
                            "Reservation activated but slot not marked occupied"
                        );
                        return Err(err);
                    }
                }
                (active, true)
            }
            None => {
                let created = self
                    .bookings
                    .create_at(
                        NewBooking {
                            vehicle_id: vehicle.id,
                            user_id: owner.id,
                            location_id,
                            request: BookingRequest::OnSite {
                                start_time: Some(now),
                            },
                        },
                        now,
                    )
                    .await?;
                (created, false)
            }
        };

        counter!("parkgate_gate_entries_total").increment(1);
        info!(
            plate = %plate,
            booking_id = %booking.id,
            spot = ?booking.spot_number,
            reused_reservation,
            "Vehicle entered"
        );

        Ok(GateEntry {
            plate,
            confidence,
            vehicle,
            owner: owner.sanitized(),
            booking,
            reused_reservation,
        })
    }

    pub async fn exit(&self, location_id: Uuid, image: &[u8]) -> DomainResult<GateExit> {
        self.exit_at(location_id, image, Utc::now()).await
    }

    pub async fn exit_at(
        &self,
        location_id: Uuid,
        image: &[u8],
        now: DateTime<Utc>,
    ) -> DomainResult<GateExit> {
        let Identified { plate, vehicle, .. } = self.identify(image).await?;

        let open = self.bookings.open_for_vehicle(vehicle.id).await?;
        let booking = open
            .iter()
            .find(|b| b.status == BookingStatus::Active)
            .or_else(|| open.first())
            .cloned()
            .ok_or_else(|| DomainError::not_found("Booking", "vehicle_id", vehicle.id))?;
        if booking.location_id != location_id {
            warn!(
                booking_id = %booking.id,
                booked_location = %booking.location_id,
                gate_location = %location_id,
                "Exit recorded at a different location than the booking"
            );
        }

        let charge = self.policy.charge_for(booking.start_time, now);
        let owner = self.owner_of(&vehicle).await?;

        let receipt = match self
            .wallets
            .charge_once(
                owner.id,
                charge.amount,
                &format!("Parking payment for {plate}"),
                &booking.id.to_string(),
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(DomainError::InsufficientFunds {
                required,
                available,
            }) => {
                counter!("parkgate_payments_declined_total").increment(1);
                warn!(
                    booking_id = %booking.id,
                    required,
                    available,
                    "Exit refused, insufficient balance"
                );
                self.events
                    .publish(EngineEvent::PaymentDeclined(PaymentDeclinedEvent {
                        booking_id: booking.id,
                        user_id: owner.id,
                        required,
                        available,
                        timestamp: now,
                    }));
                return Err(DomainError::InsufficientFunds {
                    required,
                    available,
                });
            }
            Err(err) => return Err(err),
        };
        let amount = receipt.transaction.amount;

        let settlement = match self.bookings.settle_at(booking.id, now, amount, now).await {
            Ok(settlement) => settlement,
            Err(err) => {
                error!(
                    booking_id = %booking.id,
                    transaction_id = %receipt.transaction.id,
                    step = "settle",
                    error = %err,
                    "Payment recorded but booking not closed"
                );
                return Err(err);
            }
        };

        let held_slot = settlement.held_slot();
        let completed = settlement.booking;
        // A pending reservation never occupied its slot; another car may be in it
        if let Some(spot) = completed.spot_number.as_deref().filter(|_| held_slot) {
            if let Err(err) = self
                .allocator
                .set_occupied(completed.location_id, spot, false)
                .await
            {
                error!(
                    booking_id = %completed.id,
                    slot = spot,
                    step = "release_slot",
                    error = %err,
                    "Booking closed but slot still marked occupied"
                );
                return Err(err);
            }
            self.events.publish(EngineEvent::SlotReleased(SlotEvent {
                location_id: completed.location_id,
                spot_number: spot.to_string(),
                timestamp: now,
            }));
        }

        if !receipt.replayed {
            self.events.publish(EngineEvent::PaymentSettled(PaymentEvent {
                booking_id: completed.id,
                user_id: owner.id,
                transaction_id: receipt.transaction.id,
                amount,
                billed_hours: charge.billed_hours,
                timestamp: now,
            }));
        }
        counter!("parkgate_gate_exits_total").increment(1);
        info!(
            plate = %plate,
            booking_id = %completed.id,
            billed_hours = charge.billed_hours,
            amount,
            "Vehicle exited"
        );

        Ok(GateExit {
            plate,
            booking: completed,
            transaction: receipt.transaction,
            billed_hours: charge.billed_hours,
            amount,
        })
    }

    async fn identify(&self, image: &[u8]) -> DomainResult<Identified> {
        let detection = self.recognizer.detect(image).await?;
        let plate = normalize_plate(&detection.text);
        if !is_valid_plate(&plate) {
            return Err(DomainError::Validation(format!(
                "unrecognised plate text {:?}",
                detection.text
            )));
        }
        let vehicle = self
            .repos
            .vehicles()
            .find_by_plate(&plate)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "plate_number", &plate))?;
        Ok(Identified {
            plate,
            confidence: detection.confidence,
            vehicle,
        })
    }

    async fn owner_of(&self, vehicle: &Vehicle) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(vehicle.owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Owner", "id", vehicle.owner_id))
    }
}
