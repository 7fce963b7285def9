//! Service wiring

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{PlateRecognizer, RepositoryProvider};
use crate::shared::RetryConfig;

use super::events::{create_event_bus, SharedEventBus};
use super::services::{
    BookingService, DirectoryService, GateService, LocationService, PricingPolicy, SlotAllocator,
    UserStatsService, WalletService,
};

/// All engine services sharing one store, one recognizer and one event bus
#[derive(Clone)]
pub struct Engine {
    pub wallets: WalletService,
    pub allocator: SlotAllocator,
    pub bookings: BookingService,
    pub gate: GateService,
    pub locations: LocationService,
    pub stats: UserStatsService,
    pub directory: DirectoryService,
    pub events: SharedEventBus,
}

impl Engine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        recognizer: Arc<dyn PlateRecognizer>,
        config: &AppConfig,
    ) -> Self {
        Self::with_settings(
            repos,
            recognizer,
            config.pricing,
            config.allocation.retry_config(),
        )
    }

    pub fn with_settings(
        repos: Arc<dyn RepositoryProvider>,
        recognizer: Arc<dyn PlateRecognizer>,
        policy: PricingPolicy,
        claim_retry: RetryConfig,
    ) -> Self {
        let events = create_event_bus();
        let wallets = WalletService::new(repos.clone());
        let allocator = SlotAllocator::new(repos.clone(), claim_retry);
        let bookings = BookingService::new(
            repos.clone(),
            allocator.clone(),
            wallets.clone(),
            policy,
            events.clone(),
        );
        let gate = GateService::new(
            repos.clone(),
            recognizer,
            bookings.clone(),
            wallets.clone(),
            allocator.clone(),
            policy,
            events.clone(),
        );
        let locations = LocationService::new(repos.clone(), allocator.clone(), events.clone());

        Self {
            wallets,
            allocator,
            bookings,
            gate,
            locations,
            stats: UserStatsService::new(repos.clone()),
            directory: DirectoryService::new(repos),
            events,
        }
    }
}
