//! SeaORM implementation of WalletRepository
//!
//! Balance changes and their ledger rows are written in one transaction.
//! Debits use a guarded `UPDATE ... WHERE balance >= amount` so concurrent
//! deductions never take the balance below zero.

use async_trait::async_trait;
use log::{debug, warn};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::common::{db_err, is_unique_violation};
use crate::domain::wallet::{DebitOutcome, WalletRepository};
use crate::domain::{DomainError, DomainResult, TransactionType, Wallet, WalletTransaction};
use crate::infrastructure::database::entities::{wallet, wallet_transaction};

pub struct SeaOrmWalletRepository {
    db: DatabaseConnection,
}

impl SeaOrmWalletRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn wallet_to_domain(m: wallet::Model) -> Wallet {
    Wallet {
        id: m.id,
        user_id: m.user_id,
        balance: m.balance,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn entry_to_domain(m: wallet_transaction::Model) -> DomainResult<WalletTransaction> {
    let kind = TransactionType::from_str(&m.transaction_type).ok_or_else(|| {
        DomainError::Upstream(format!(
            "transaction {} has unknown type '{}'",
            m.id, m.transaction_type
        ))
    })?;
    Ok(WalletTransaction {
        id: m.id,
        wallet_id: m.wallet_id,
        kind,
        amount: m.amount,
        description: m.description,
        reference: m.reference,
        created_at: m.created_at,
    })
}

fn entry_active_model(e: &WalletTransaction) -> wallet_transaction::ActiveModel {
    wallet_transaction::ActiveModel {
        id: Set(e.id),
        wallet_id: Set(e.wallet_id),
        transaction_type: Set(e.kind.as_str().to_string()),
        amount: Set(e.amount),
        description: Set(e.description.clone()),
        reference: Set(e.reference.clone()),
        created_at: Set(e.created_at),
    }
}

async fn find_reference<C: ConnectionTrait>(
    conn: &C,
    wallet_id: Uuid,
    reference: Option<&str>,
) -> DomainResult<Option<WalletTransaction>> {
    let Some(reference) = reference else {
        return Ok(None);
    };
    wallet_transaction::Entity::find()
        .filter(wallet_transaction::Column::WalletId.eq(wallet_id))
        .filter(wallet_transaction::Column::Reference.eq(reference))
        .one(conn)
        .await
        .map_err(db_err)?
        .map(entry_to_domain)
        .transpose()
}

async fn find_wallet<C: ConnectionTrait>(conn: &C, wallet_id: Uuid) -> DomainResult<Wallet> {
    wallet::Entity::find_by_id(wallet_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .map(wallet_to_domain)
        .ok_or_else(|| DomainError::not_found("Wallet", "id", wallet_id))
}

// ── WalletRepository impl ───────────────────────────────────────

#[async_trait]
impl WalletRepository for SeaOrmWalletRepository {
    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Option<Wallet>> {
        Ok(wallet::Entity::find()
            .filter(wallet::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(wallet_to_domain))
    }

    async fn create_if_absent(&self, w: Wallet) -> DomainResult<Wallet> {
        let model = wallet::ActiveModel {
            id: Set(w.id),
            user_id: Set(w.user_id),
            balance: Set(w.balance),
            created_at: Set(w.created_at),
            updated_at: Set(w.updated_at),
        };
        match model.insert(&self.db).await {
            Ok(created) => {
                debug!("Created wallet {} for user {}", created.id, created.user_id);
                Ok(wallet_to_domain(created))
            }
            Err(e) if is_unique_violation(&e) => self
                .find_by_user(w.user_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Wallet", "user_id", w.user_id)),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn credit(&self, entry: WalletTransaction) -> DomainResult<Wallet> {
        if entry.kind == TransactionType::Deduct {
            return Err(DomainError::Validation("credit needs a positive entry".into()));
        }
        debug!(
            "Crediting wallet {} with {} ({})",
            entry.wallet_id,
            entry.amount,
            entry.kind.as_str()
        );

        let txn = self.db.begin().await.map_err(db_err)?;
        let result = wallet::Entity::update_many()
            .col_expr(
                wallet::Column::Balance,
                Expr::col(wallet::Column::Balance).add(entry.amount),
            )
            .col_expr(wallet::Column::UpdatedAt, Expr::value(entry.created_at))
            .filter(wallet::Column::Id.eq(entry.wallet_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Wallet", "id", entry.wallet_id));
        }

        if let Err(e) = entry_active_model(&entry).insert(&txn).await {
            return Err(if is_unique_violation(&e) {
                DomainError::Conflict(format!(
                    "reference {} already recorded",
                    entry.reference.as_deref().unwrap_or_default()
                ))
            } else {
                db_err(e)
            });
        }

        let updated = find_wallet(&txn, entry.wallet_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    async fn debit(&self, entry: WalletTransaction) -> DomainResult<DebitOutcome> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if let Some(existing) =
            find_reference(&txn, entry.wallet_id, entry.reference.as_deref()).await?
        {
            debug!("Debit reference {:?} already applied", entry.reference);
            return Ok(DebitOutcome::Duplicate(existing));
        }

        let result = wallet::Entity::update_many()
            .col_expr(
                wallet::Column::Balance,
                Expr::col(wallet::Column::Balance).sub(entry.amount),
            )
            .col_expr(wallet::Column::UpdatedAt, Expr::value(entry.created_at))
            .filter(wallet::Column::Id.eq(entry.wallet_id))
            .filter(wallet::Column::Balance.gte(entry.amount))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            let current = find_wallet(&txn, entry.wallet_id).await?;
            return Ok(DebitOutcome::Insufficient {
                balance: current.balance,
            });
        }

        if let Err(e) = entry_active_model(&entry).insert(&txn).await {
            if !is_unique_violation(&e) {
                return Err(db_err(e));
            }
            drop(txn);
            warn!("Concurrent debit recorded reference {:?} first", entry.reference);
            return find_reference(&self.db, entry.wallet_id, entry.reference.as_deref())
                .await?
                .map(DebitOutcome::Duplicate)
                .ok_or_else(|| db_err(e));
        }

        txn.commit().await.map_err(db_err)?;
        debug!("Debited {} from wallet {}", entry.amount, entry.wallet_id);
        Ok(DebitOutcome::Applied(entry))
    }

    async fn transactions(&self, wallet_id: Uuid) -> DomainResult<Vec<WalletTransaction>> {
        wallet_transaction::Entity::find()
            .filter(wallet_transaction::Column::WalletId.eq(wallet_id))
            .order_by_desc(wallet_transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(entry_to_domain)
            .collect()
    }
}
