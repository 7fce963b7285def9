//! Application services

mod allocation;
mod billing;
mod booking;
mod directory;
mod gate;
mod location;
mod stats;
mod wallet;

pub use allocation::SlotAllocator;
pub use billing::{ParkingCharge, PricingPolicy};
pub use booking::{BookingDetails, BookingService, Settlement};
pub use directory::DirectoryService;
pub use gate::{GateEntry, GateExit, GateService};
pub use location::LocationService;
pub use stats::{UserStats, UserStatsService};
pub use wallet::{ChargeReceipt, WalletService};
