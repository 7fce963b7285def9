//! Application layer: use cases over the domain repositories

pub mod engine;
pub mod events;
pub mod services;

pub use engine::Engine;
pub use events::{create_event_bus, EngineEvent, EventBus, EventSubscriber, SharedEventBus};
pub use services::{
    BookingDetails, BookingService, DirectoryService, GateEntry, GateExit, GateService,
    LocationService, PricingPolicy, SlotAllocator, UserStats, UserStatsService, WalletService,
};
