//! Vehicle aggregate

pub mod model;
pub mod repository;

mod dto;

pub use dto::RegisterVehicleDto;
pub use model::Vehicle;
pub use repository::VehicleRepository;
