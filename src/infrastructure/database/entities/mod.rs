//! Database entities module

pub mod booking;
pub mod parking_location;
pub mod parking_slot;
pub mod user;
pub mod vehicle;
pub mod wallet;
pub mod wallet_transaction;

pub use booking::Entity as Booking;
pub use parking_location::Entity as ParkingLocation;
pub use parking_slot::Entity as ParkingSlot;
pub use user::Entity as User;
pub use vehicle::Entity as Vehicle;
pub use wallet::Entity as Wallet;
pub use wallet_transaction::Entity as WalletTransaction;
