//! Booking domain entity and lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Reserved ahead of arrival
    Pending,
    /// Vehicle is inside the facility
    Active,
    /// Vehicle left and the stay was paid
    Completed,
    /// Reservation withdrawn before arrival
    Cancelled,
}

impl BookingStatus {
    /// Statuses that still hold a slot
    pub const OPEN: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Legal lifecycle edges. Pending → Completed covers a gate exit for a
    /// reservation whose entry was never recorded.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Completed)
                | (Self::Active, Self::Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the booking came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    /// Reserved in advance for an explicit slot and window
    PreBooked,
    /// Created at the gate, slot chosen by the allocator
    OnSite,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreBooked => "pre_booked",
            Self::OnSite => "on_site",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pre_booked" => Some(Self::PreBooked),
            "on_site" => Some(Self::OnSite),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller intent for a new booking. On-site requests never carry a slot;
/// pre-booked requests always do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "booking_type", rename_all = "snake_case")]
pub enum BookingRequest {
    PreBooked {
        spot_number: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    },
    OnSite {
        start_time: Option<DateTime<Utc>>,
    },
}

impl BookingRequest {
    pub fn kind(&self) -> BookingKind {
        match self {
            Self::PreBooked { .. } => BookingKind::PreBooked,
            Self::OnSite { .. } => BookingKind::OnSite,
        }
    }
}

/// Everything needed to create a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    #[serde(flatten)]
    pub request: BookingRequest,
}

/// Conditional status change applied by the repository: the write only
/// happens if the stored status still equals `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub total_amount: Option<i64>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    pub fn new(from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            end_time: None,
            total_amount: None,
            at,
        }
    }

    pub fn completing(
        from: BookingStatus,
        end_time: DateTime<Utc>,
        total_amount: i64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            from,
            to: BookingStatus::Completed,
            end_time: Some(end_time),
            total_amount: Some(total_amount),
            at,
        }
    }
}

/// Parking booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    /// Assigned slot number
    pub spot_number: Option<String>,
    /// Points charged; present only once completed
    pub total_amount: Option<i64>,
    #[serde(rename = "booking_type")]
    pub kind: BookingKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Reservation for an explicit slot, waiting for the vehicle to arrive
    pub fn pre_booked(
        vehicle_id: Uuid,
        user_id: Uuid,
        location_id: Uuid,
        spot_number: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            user_id,
            location_id,
            start_time,
            end_time,
            status: BookingStatus::Pending,
            spot_number: Some(spot_number.into()),
            total_amount: None,
            kind: BookingKind::PreBooked,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gate-entry booking; the vehicle is already inside
    pub fn on_site(
        vehicle_id: Uuid,
        user_id: Uuid,
        location_id: Uuid,
        spot_number: impl Into<String>,
        start_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            user_id,
            location_id,
            start_time,
            end_time: None,
            status: BookingStatus::Active,
            spot_number: Some(spot_number.into()),
            total_amount: None,
            kind: BookingKind::OnSite,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Interval test used for pre-booked requests with a known end:
    /// half-open overlap, or an identical start. A booking without an end
    /// only matches through the equal-start clause.
    pub fn conflicts_with_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let overlaps = self.start_time < end && self.end_time.is_some_and(|e| e > start);
        overlaps || self.start_time == start
    }

    /// Whether this booking holds its slot at `now`
    pub fn holds_slot_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && self.end_time.map_or(true, |e| e > now)
    }

    /// Whether `now` falls inside the reserved window (inclusive on both
    /// ends; an open-ended window never closes).
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && self.end_time.map_or(true, |e| now <= e)
    }

    /// Apply a status change in place. Callers check legality first.
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.to;
        if change.end_time.is_some() {
            self.end_time = change.end_time;
        }
        if change.total_amount.is_some() {
            self.total_amount = change.total_amount;
        }
        self.updated_at = change.at;
    }
}

// ── Tests ──────────────────────────────────────────────────────
