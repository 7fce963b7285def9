//! Wallet ledger service

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::wallet::DebitOutcome;
use crate::domain::{
    DomainResult, RepositoryProvider, TransactionType, Wallet, WalletTransaction,
};
use crate::shared::errors::DomainError;

/// Result of a referenced charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub transaction: WalletTransaction,
    /// The reference had already been charged; `transaction` is that
    /// earlier entry and nothing new was written
    pub replayed: bool,
}

/// Points ledger per user.
///
/// Every balance change is written together with its log entry, so the
/// balance always equals the signed sum of the log.
#[derive(Clone)]
pub struct WalletService {
    repos: Arc<dyn RepositoryProvider>,
}

impl WalletService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Existing wallet of `user_id`, or a new empty one
    pub async fn get_or_create(&self, user_id: Uuid) -> DomainResult<Wallet> {
        if let Some(wallet) = self.repos.wallets().find_by_user(user_id).await? {
            return Ok(wallet);
        }
        let wallet = self.repos.wallets().create_if_absent(Wallet::new(user_id)).await?;
        debug!(user_id = %user_id, wallet_id = %wallet.id, "Wallet ready");
        Ok(wallet)
    }

    pub async fn top_up(&self, user_id: Uuid, amount: i64) -> DomainResult<WalletTransaction> {
        ensure_positive(amount)?;
        let wallet = self.get_or_create(user_id).await?;
        let entry = WalletTransaction::new(wallet.id, TransactionType::TopUp, amount, "Wallet top-up");

        let updated = self.repos.wallets().credit(entry.clone()).await?;
        info!(
            user_id = %user_id,
            amount,
            balance = updated.balance,
            "Wallet topped up"
        );
        Ok(entry)
    }

    pub async fn deduct(
        &self,
        user_id: Uuid,
        amount: i64,
        description: &str,
    ) -> DomainResult<WalletTransaction> {
        let wallet = self.existing_wallet(user_id, amount).await?;
        let entry = WalletTransaction::new(wallet.id, TransactionType::Deduct, amount, description);
        match self.repos.wallets().debit(entry).await? {
            DebitOutcome::Applied(tx) => {
                info!(user_id = %user_id, amount, "Wallet debited");
                Ok(tx)
            }
            DebitOutcome::Insufficient { balance } => Err(DomainError::InsufficientFunds {
                required: amount,
                available: balance,
            }),
            DebitOutcome::Duplicate(tx) => Err(DomainError::Conflict(format!(
                "transaction {} already recorded",
                tx.id
            ))),
        }
    }

    /// Deduct at most once per `reference`. A repeated call with the same
    /// reference returns the original entry without touching the balance.
    pub async fn charge_once(
        &self,
        user_id: Uuid,
        amount: i64,
        description: &str,
        reference: &str,
    ) -> DomainResult<ChargeReceipt> {
        let wallet = self.existing_wallet(user_id, amount).await?;
        let entry = WalletTransaction::new(wallet.id, TransactionType::Deduct, amount, description)
            .with_reference(reference);
        match self.repos.wallets().debit(entry).await? {
            DebitOutcome::Applied(transaction) => {
                info!(user_id = %user_id, amount, reference, "Wallet charged");
                Ok(ChargeReceipt {
                    transaction,
                    replayed: false,
                })
            }
            DebitOutcome::Duplicate(transaction) => {
                warn!(
                    user_id = %user_id,
                    reference,
                    transaction_id = %transaction.id,
                    "Charge already recorded, not debiting again"
                );
                Ok(ChargeReceipt {
                    transaction,
                    replayed: true,
                })
            }
            DebitOutcome::Insufficient { balance } => Err(DomainError::InsufficientFunds {
                required: amount,
                available: balance,
            }),
        }
    }

    pub async fn refund(
        &self,
        user_id: Uuid,
        amount: i64,
        description: &str,
    ) -> DomainResult<WalletTransaction> {
        let wallet = self.existing_wallet(user_id, amount).await?;
        let entry = WalletTransaction::new(wallet.id, TransactionType::Refund, amount, description);
        let updated = self.repos.wallets().credit(entry.clone()).await?;
        info!(user_id = %user_id, amount, balance = updated.balance, "Wallet refunded");
        Ok(entry)
    }

    pub async fn balance(&self, user_id: Uuid) -> DomainResult<i64> {
        Ok(self.get_or_create(user_id).await?.balance)
    }

    /// Ledger of the user's wallet, newest first
    pub async fn transactions(&self, user_id: Uuid) -> DomainResult<Vec<WalletTransaction>> {
        let wallet = self.get_or_create(user_id).await?;
        self.repos.wallets().transactions(wallet.id).await
    }

    async fn existing_wallet(&self, user_id: Uuid, amount: i64) -> DomainResult<Wallet> {
        ensure_positive(amount)?;
        self.repos
            .wallets()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Wallet", "user_id", user_id))
    }
}

fn ensure_positive(amount: i64) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
