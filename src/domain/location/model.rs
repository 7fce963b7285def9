//! Parking location domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of physical space a slot offers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    #[default]
    Standard,
    Handicap,
    Electric,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Handicap => "handicap",
            Self::Electric => "electric",
        }
    }

    /// Unknown tags fall back to a standard slot.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "handicap" => Self::Handicap,
            "electric" => Self::Electric,
            _ => Self::Standard,
        }
    }
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A numbered parking space inside a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot identifier, unique within its location (e.g. "A1")
    pub number: String,
    /// Physical occupancy, independent of any booking state
    pub occupied: bool,
    pub slot_type: SlotType,
}

impl Slot {
    pub fn new(number: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            number: number.into(),
            occupied: false,
            slot_type,
        }
    }

    pub fn occupied(mut self) -> Self {
        self.occupied = true;
        self
    }
}

/// Parking facility with an ordered slot catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLocation {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// Slots in allocation order
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingLocation {
    pub fn new(name: impl Into<String>, address: impl Into<String>, slots: Vec<Slot>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            slots,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    pub fn get_slot(&self, number: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.number == number)
    }

    pub fn get_slot_mut(&mut self, number: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.number == number)
    }

    pub fn has_slot(&self, number: &str) -> bool {
        self.get_slot(number).is_some()
    }

    /// First unoccupied slot in stored order.
    pub fn first_free_slot(&self) -> Option<&Slot> {
        self.slots.iter().find(|s| !s.occupied)
    }

    /// Returns the first slot number that appears more than once.
    pub fn duplicate_slot_number(&self) -> Option<&str> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            self.slots[..i]
                .iter()
                .any(|earlier| earlier.number == slot.number)
                .then_some(slot.number.as_str())
        })
    }

    /// Set the occupied flag. Returns false if the slot does not exist.
    pub fn set_slot_occupied(&mut self, number: &str, occupied: bool) -> bool {
        match self.get_slot_mut(number) {
            Some(slot) => {
                slot.occupied = occupied;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Mark a free slot occupied. Returns false if the slot is missing or
    /// already occupied.
    pub fn claim_slot(&mut self, number: &str) -> bool {
        match self.get_slot_mut(number) {
            Some(slot) if !slot.occupied => {
                slot.occupied = true;
                self.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
