//! Vehicle directory entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::recognition::normalize_plate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    /// Normalised plate: uppercase letters and digits only
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    /// Owning user
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        plate_number: &str,
        brand: impl Into<String>,
        model: impl Into<String>,
        owner_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate_number: normalize_plate(plate_number),
            brand: brand.into(),
            model: model.into(),
            owner_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_stored_normalised() {
        let v = Vehicle::new("cab-1234", "Toyota", "Aqua", Uuid::new_v4());
        assert_eq!(v.plate_number, "CAB1234");
    }
}
