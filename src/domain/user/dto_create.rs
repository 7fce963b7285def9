use serde::Deserialize;
use validator::Validate;

use super::UserRole;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Already hashed by the credential service
    #[serde(default)]
    pub password_hash: Option<String>,
}
