//! Wallet repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{DebitOutcome, Wallet, WalletTransaction};
use crate::domain::DomainResult;

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Option<Wallet>>;

    /// Insert `wallet` unless the user already owns one; returns whichever
    /// wallet ends up stored
    async fn create_if_absent(&self, wallet: Wallet) -> DomainResult<Wallet>;

    /// Log a positive entry and add its amount to the balance in one write.
    /// Returns the updated wallet.
    async fn credit(&self, entry: WalletTransaction) -> DomainResult<Wallet>;

    /// Log a deduct entry and subtract its amount in one write, only if the
    /// balance covers it and no entry with the same reference exists
    async fn debit(&self, entry: WalletTransaction) -> DomainResult<DebitOutcome>;

    /// Ledger of a wallet, newest first
    async fn transactions(&self, wallet_id: Uuid) -> DomainResult<Vec<WalletTransaction>>;
}
