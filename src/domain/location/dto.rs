//! Location catalog DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Slot, SlotType};

/// Slot definition supplied when creating or replacing a slot catalog
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotDto {
    #[validate(length(min = 1, max = 20, message = "slot number must be 1–20 characters"))]
    pub number: String,
    #[serde(default)]
    pub slot_type: SlotType,
    #[serde(default)]
    pub occupied: bool,
}

impl SlotDto {
    pub fn new(number: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            number: number.into(),
            slot_type,
            occupied: false,
        }
    }
}

impl From<SlotDto> for Slot {
    fn from(dto: SlotDto) -> Self {
        Slot {
            number: dto.number.trim().to_string(),
            occupied: dto.occupied,
            slot_type: dto.slot_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationDto {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "at least one slot is required"))]
    pub slots: Vec<SlotDto>,
}

/// Partial update; absent fields keep their stored value. A supplied slot
/// list replaces the whole catalog.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationDto {
    #[validate(length(min = 1, max = 100, message = "name must be 1–100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200, message = "address must be 1–200 characters"))]
    pub address: Option<String>,
    #[validate(length(min = 1, message = "at least one slot is required"))]
    pub slots: Option<Vec<SlotDto>>,
}
