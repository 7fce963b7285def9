use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterVehicleDto {
    #[validate(length(min = 1, max = 20, message = "plate number is required"))]
    pub plate_number: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub brand: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub model: String,
    pub owner_id: Uuid,
}
