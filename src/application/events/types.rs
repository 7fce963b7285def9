//! Engine events
//!
//! Everything the reservation engine broadcasts to in-process subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event types emitted by the booking, wallet and gate services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineEvent {
    BookingCreated(BookingEvent),
    BookingActivated(BookingEvent),
    BookingCompleted(BookingEvent),
    BookingCancelled(BookingEvent),
    PaymentSettled(PaymentEvent),
    PaymentDeclined(PaymentDeclinedEvent),
    SlotReleased(SlotEvent),
}

impl EngineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BookingCreated(_) => "booking_created",
            Self::BookingActivated(_) => "booking_activated",
            Self::BookingCompleted(_) => "booking_completed",
            Self::BookingCancelled(_) => "booking_cancelled",
            Self::PaymentSettled(_) => "payment_settled",
            Self::PaymentDeclined(_) => "payment_declined",
            Self::SlotReleased(_) => "slot_released",
        }
    }

    pub fn location_id(&self) -> Option<Uuid> {
        match self {
            Self::BookingCreated(e)
            | Self::BookingActivated(e)
            | Self::BookingCompleted(e)
            | Self::BookingCancelled(e) => Some(e.location_id),
            Self::SlotReleased(e) => Some(e.location_id),
            Self::PaymentSettled(_) | Self::PaymentDeclined(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub location_id: Uuid,
    pub spot_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: i64,
    pub billed_hours: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDeclinedEvent {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub required: i64,
    pub available: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotEvent {
    pub location_id: Uuid,
    pub spot_number: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: EngineEvent,
}

impl EventMessage {
    pub fn new(event: EngineEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}
