//! User aggregate
//!
//! Directory record for account owners. Contains the User entity, the
//! registration DTO and the repository interface.

pub mod model;
pub mod repository;

mod dto_create;

pub use model::{User, UserRole, UserStatus};

pub use dto_create::CreateUserDto;

pub use repository::UserRepository;
