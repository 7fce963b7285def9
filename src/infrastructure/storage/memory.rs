//! In-memory repositories for development and testing
//!
//! Conditional writes run under the DashMap entry lock of the record they
//! touch, which gives the same compare-and-set guarantees the SQL backend
//! gets from `UPDATE … WHERE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::booking::{vehicle_already_active, BookingRepository, StatusChange};
use crate::domain::location::LocationRepository;
use crate::domain::user::UserRepository;
use crate::domain::vehicle::VehicleRepository;
use crate::domain::wallet::{DebitOutcome, WalletRepository};
use crate::domain::{
    Booking, BookingKind, BookingStatus, DomainResult, ParkingLocation, RepositoryProvider,
    TransactionType, User, Vehicle, Wallet, WalletTransaction,
};
use crate::shared::errors::DomainError;

/// All repositories backed by process memory
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    locations: InMemoryLocations,
    bookings: InMemoryBookings,
    wallets: InMemoryWallets,
    vehicles: InMemoryVehicles,
    users: InMemoryUsers,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        &self.locations
    }
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
    fn wallets(&self) -> &dyn WalletRepository {
        &self.wallets
    }
    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}

// ── Locations ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryLocations {
    locations: DashMap<Uuid, ParkingLocation>,
}

#[async_trait]
impl LocationRepository for InMemoryLocations {
    async fn save(&self, location: ParkingLocation) -> DomainResult<()> {
        match self.locations.entry(location.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "location {} already exists",
                location.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(location);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<ParkingLocation>> {
        Ok(self.locations.get(&id).map(|l| l.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>> {
        let mut all: Vec<ParkingLocation> =
            self.locations.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(all)
    }

    async fn update(&self, location: ParkingLocation) -> DomainResult<()> {
        match self.locations.get_mut(&location.id) {
            Some(mut stored) => {
                *stored = location;
                Ok(())
            }
            None => Err(DomainError::not_found("Location", "id", location.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.locations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Location", "id", id))
    }

    async fn claim_slot(&self, location_id: Uuid, number: &str) -> DomainResult<bool> {
        let mut location = self
            .locations
            .get_mut(&location_id)
            .ok_or_else(|| DomainError::not_found("Location", "id", location_id))?;
        if !location.has_slot(number) {
            return Err(DomainError::not_found("Slot", "number", number));
        }
        Ok(location.claim_slot(number))
    }

    async fn set_slot_occupied(
        &self,
        location_id: Uuid,
        number: &str,
        occupied: bool,
    ) -> DomainResult<()> {
        let mut location = self
            .locations
            .get_mut(&location_id)
            .ok_or_else(|| DomainError::not_found("Location", "id", location_id))?;
        if location.set_slot_occupied(number, occupied) {
            Ok(())
        } else {
            Err(DomainError::not_found("Slot", "number", number))
        }
    }
}

// ── Bookings ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryBookings {
    bookings: DashMap<Uuid, Booking>,
    /// vehicle id → its active booking. Locked before `bookings`.
    active: DashMap<Uuid, Uuid>,
}

impl InMemoryBookings {
    fn collect(&self, filter: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        found
    }
}

fn on_spot(booking: &Booking, spot_number: &str) -> bool {
    booking.is_open() && booking.spot_number.as_deref() == Some(spot_number)
}

#[async_trait]
impl BookingRepository for InMemoryBookings {
    async fn insert(&self, booking: Booking) -> DomainResult<()> {
        let active = if booking.status == BookingStatus::Active {
            match self.active.entry(booking.vehicle_id) {
                Entry::Occupied(_) => return Err(vehicle_already_active(booking.vehicle_id)),
                Entry::Vacant(slot) => Some(slot),
            }
        } else {
            None
        };
        match self.bookings.entry(booking.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "booking {} already exists",
                booking.id
            ))),
            Entry::Vacant(slot) => {
                if let Some(index) = active {
                    index.insert(booking.id);
                }
                slot.insert(booking);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.clone()))
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| b.vehicle_id == vehicle_id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Booking>> {
        let mut found = self.collect(|b| b.user_id == user_id);
        found.reverse();
        Ok(found)
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| b.vehicle_id == vehicle_id && b.is_open()))
    }

    async fn find_reservation_at(
        &self,
        vehicle_id: Uuid,
        location_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Booking>> {
        Ok(self
            .collect(|b| {
                b.vehicle_id == vehicle_id
                    && b.location_id == location_id
                    && b.status == BookingStatus::Pending
                    && b.kind == BookingKind::PreBooked
                    && b.window_contains(at)
            })
            .into_iter()
            .next())
    }

    async fn find_range_conflicts(
        &self,
        spot_number: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| on_spot(b, spot_number) && b.conflicts_with_range(start, end)))
    }

    async fn find_current_holders(
        &self,
        spot_number: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| on_spot(b, spot_number) && b.holds_slot_at(at)))
    }

    async fn transition(&self, id: Uuid, change: StatusChange) -> DomainResult<Option<Booking>> {
        let vehicle_id = self
            .bookings
            .get(&id)
            .map(|b| b.vehicle_id)
            .ok_or_else(|| DomainError::not_found("Booking", "id", id))?;
        let index = self.active.entry(vehicle_id);
        let mut booking = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Booking", "id", id))?;
        if booking.status != change.from {
            return Ok(None);
        }
        match (change.from, change.to) {
            (_, BookingStatus::Active) => match index {
                Entry::Occupied(held) if *held.get() != id => {
                    return Err(vehicle_already_active(vehicle_id));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            },
            (BookingStatus::Active, _) => {
                if let Entry::Occupied(held) = index {
                    if *held.get() == id {
                        held.remove();
                    }
                }
            }
            _ => {}
        }
        booking.apply(&change);
        Ok(Some(booking.clone()))
    }
}

// ── Wallets ────────────────────────────────────────────────────

struct Ledger {
    wallet: Wallet,
    /// Oldest first
    entries: Vec<WalletTransaction>,
}

impl Ledger {
    fn find_reference(&self, reference: Option<&str>) -> Option<&WalletTransaction> {
        let reference = reference?;
        self.entries
            .iter()
            .find(|e| e.reference.as_deref() == Some(reference))
    }
}

#[derive(Default)]
pub struct InMemoryWallets {
    ledgers: DashMap<Uuid, Ledger>,
    /// user id → wallet id
    owners: DashMap<Uuid, Uuid>,
}

#[async_trait]
impl WalletRepository for InMemoryWallets {
    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Option<Wallet>> {
        let Some(wallet_id) = self.owners.get(&user_id).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.ledgers.get(&wallet_id).map(|l| l.wallet.clone()))
    }

    async fn create_if_absent(&self, wallet: Wallet) -> DomainResult<Wallet> {
        match self.owners.entry(wallet.user_id) {
            Entry::Occupied(owner) => self
                .ledgers
                .get(owner.get())
                .map(|l| l.wallet.clone())
                .ok_or_else(|| DomainError::not_found("Wallet", "id", owner.get())),
            Entry::Vacant(owner) => {
                self.ledgers.insert(
                    wallet.id,
                    Ledger {
                        wallet: wallet.clone(),
                        entries: Vec::new(),
                    },
                );
                owner.insert(wallet.id);
                Ok(wallet)
            }
        }
    }

    async fn credit(&self, entry: WalletTransaction) -> DomainResult<Wallet> {
        if entry.kind == TransactionType::Deduct {
            return Err(DomainError::Validation("credit needs a positive entry".into()));
        }
        let mut ledger = self
            .ledgers
            .get_mut(&entry.wallet_id)
            .ok_or_else(|| DomainError::not_found("Wallet", "id", entry.wallet_id))?;
        if let Some(existing) = ledger.find_reference(entry.reference.as_deref()) {
            return Err(DomainError::Conflict(format!(
                "reference already recorded by transaction {}",
                existing.id
            )));
        }
        ledger.wallet.balance += entry.amount;
        ledger.wallet.updated_at = entry.created_at;
        ledger.entries.push(entry);
        Ok(ledger.wallet.clone())
    }

    async fn debit(&self, entry: WalletTransaction) -> DomainResult<DebitOutcome> {
        let mut ledger = self
            .ledgers
            .get_mut(&entry.wallet_id)
            .ok_or_else(|| DomainError::not_found("Wallet", "id", entry.wallet_id))?;
        if let Some(existing) = ledger.find_reference(entry.reference.as_deref()) {
            return Ok(DebitOutcome::Duplicate(existing.clone()));
        }
        if ledger.wallet.balance < entry.amount {
            return Ok(DebitOutcome::Insufficient {
                balance: ledger.wallet.balance,
            });
        }
        ledger.wallet.balance -= entry.amount;
        ledger.wallet.updated_at = entry.created_at;
        ledger.entries.push(entry.clone());
        Ok(DebitOutcome::Applied(entry))
    }

    async fn transactions(&self, wallet_id: Uuid) -> DomainResult<Vec<WalletTransaction>> {
        Ok(self
            .ledgers
            .get(&wallet_id)
            .map(|l| l.entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

// ── Directory ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryVehicles {
    vehicles: DashMap<Uuid, Vehicle>,
    /// plate → vehicle id
    plates: DashMap<String, Uuid>,
}

#[async_trait]
impl VehicleRepository for InMemoryVehicles {
    async fn save(&self, vehicle: Vehicle) -> DomainResult<()> {
        match self.plates.entry(vehicle.plate_number.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "plate {} is already registered",
                vehicle.plate_number
            ))),
            Entry::Vacant(plate) => {
                self.vehicles.insert(vehicle.id, vehicle.clone());
                plate.insert(vehicle.id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>> {
        Ok(self.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn find_by_plate(&self, plate_number: &str) -> DomainResult<Option<Vehicle>> {
        let Some(id) = self.plates.get(plate_number).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Vehicle>> {
        let mut owned: Vec<Vehicle> = self
            .vehicles
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .map(|e| e.value().clone())
            .collect();
        owned.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: DashMap<Uuid, User>,
    /// lowercase email → user id
    emails: DashMap<String, Uuid>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn save(&self, user: User) -> DomainResult<()> {
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "email {} is already registered",
                user.email
            ))),
            Entry::Vacant(email) => {
                self.users.insert(user.id, user.clone());
                email.insert(user.id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let Some(id) = self
            .emails
            .get(&email.trim().to_lowercase())
            .map(|id| *id)
        else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Slot, SlotType};
    use std::sync::Arc;

    #[tokio::test]
    async fn slot_claim_is_compare_and_set() {
        let repos = InMemoryRepositoryProvider::new();
        let location =
            ParkingLocation::new("Central", "1 Main St", vec![Slot::new("A1", SlotType::Standard)]);
        let id = location.id;
        repos.locations().save(location).await.unwrap();

        assert!(repos.locations().claim_slot(id, "A1").await.unwrap());
        assert!(!repos.locations().claim_slot(id, "A1").await.unwrap());
        assert!(repos.locations().claim_slot(id, "B1").await.is_err());
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let location =
            ParkingLocation::new("Central", "1 Main St", vec![Slot::new("A1", SlotType::Standard)]);
        let id = location.id;
        repos.locations().save(location).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repos = repos.clone();
                tokio::spawn(async move { repos.locations().claim_slot(id, "A1").await.unwrap() })
            })
            .collect();
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn transition_requires_expected_status() {
        let repos = InMemoryRepositoryProvider::new();
        let now = Utc::now();
        let booking = Booking::on_site(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), "A1", now, now);
        let id = booking.id;
        repos.bookings().insert(booking).await.unwrap();

        let done = StatusChange::completing(BookingStatus::Active, now, 100, now);
        assert!(repos.bookings().transition(id, done.clone()).await.unwrap().is_some());
        assert!(repos.bookings().transition(id, done).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn one_active_booking_per_vehicle() {
        let repos = InMemoryRepositoryProvider::new();
        let now = Utc::now();
        let vehicle = Uuid::new_v4();
        let first = Booking::on_site(vehicle, Uuid::new_v4(), Uuid::new_v4(), "A1", now, now);
        let first_id = first.id;
        repos.bookings().insert(first).await.unwrap();

        let second = Booking::on_site(vehicle, Uuid::new_v4(), Uuid::new_v4(), "A2", now, now);
        let err = repos.bookings().insert(second.clone()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let reservation =
            Booking::pre_booked(vehicle, Uuid::new_v4(), Uuid::new_v4(), "B1", now, None, now);
        let reservation_id = reservation.id;
        repos.bookings().insert(reservation).await.unwrap();
        let arrive = StatusChange::new(BookingStatus::Pending, BookingStatus::Active, now);
        let err = repos
            .bookings()
            .transition(reservation_id, arrive.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let done = StatusChange::completing(BookingStatus::Active, now, 100, now);
        repos.bookings().transition(first_id, done).await.unwrap();
        assert!(repos
            .bookings()
            .transition(reservation_id, arrive)
            .await
            .unwrap()
            .is_some());
        assert!(repos.bookings().insert(second).await.is_err());
    }

    #[tokio::test]
    async fn wallet_created_once_per_user() {
        let repos = InMemoryRepositoryProvider::new();
        let user = Uuid::new_v4();
        let first = repos.wallets().create_if_absent(Wallet::new(user)).await.unwrap();
        let second = repos.wallets().create_if_absent(Wallet::new(user)).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn debit_reports_duplicate_reference() {
        let repos = InMemoryRepositoryProvider::new();
        let wallet = repos
            .wallets()
            .create_if_absent(Wallet::new(Uuid::new_v4()))
            .await
            .unwrap();
        repos
            .wallets()
            .credit(WalletTransaction::new(wallet.id, TransactionType::TopUp, 500, "top up"))
            .await
            .unwrap();

        let charge = || {
            WalletTransaction::new(wallet.id, TransactionType::Deduct, 200, "parking")
                .with_reference("booking-1")
        };
        let first = repos.wallets().debit(charge()).await.unwrap();
        let second = repos.wallets().debit(charge()).await.unwrap();
        assert!(matches!(first, DebitOutcome::Applied(_)));
        assert!(matches!(second, DebitOutcome::Duplicate(_)));

        let log = repos.wallets().transactions(wallet.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, TransactionType::Deduct);
    }
}
