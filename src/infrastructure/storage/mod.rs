//! In-process repository implementations

mod memory;

pub use memory::{
    InMemoryBookings, InMemoryLocations, InMemoryRepositoryProvider, InMemoryUsers,
    InMemoryVehicles, InMemoryWallets,
};
