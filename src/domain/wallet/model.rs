//! Wallet ledger entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    TopUp,
    Deduct,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::Deduct => "deduct",
            Self::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top_up" => Some(Self::TopUp),
            "deduct" => Some(Self::Deduct),
            "refund" => Some(Self::Refund),
            _ => None,
        }
    }

    /// Sign applied to the amount when folding the log into a balance
    pub fn sign(&self) -> i64 {
        match self {
            Self::TopUp | Self::Refund => 1,
            Self::Deduct => -1,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user points account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Never negative
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive; direction comes from `kind`
    pub amount: i64,
    pub description: String,
    /// Business key making a charge idempotent (the booking id for parking
    /// payments). Unique per wallet when present.
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    pub fn new(
        wallet_id: Uuid,
        kind: TransactionType,
        amount: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount,
            description: description.into(),
            reference: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn signed_amount(&self) -> i64 {
        self.kind.sign() * self.amount
    }
}

/// Result of a conditional debit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Balance decremented and the entry logged
    Applied(WalletTransaction),
    /// Balance below the requested amount; nothing written
    Insufficient { balance: i64 },
    /// An entry with the same reference already exists; nothing written
    Duplicate(WalletTransaction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_is_empty() {
        let w = Wallet::new(Uuid::new_v4());
        assert_eq!(w.balance, 0);
    }

    #[test]
    fn signed_amount_follows_type() {
        let wallet_id = Uuid::new_v4();
        let top_up = WalletTransaction::new(wallet_id, TransactionType::TopUp, 500, "top up");
        let deduct = WalletTransaction::new(wallet_id, TransactionType::Deduct, 200, "parking");
        let refund = WalletTransaction::new(wallet_id, TransactionType::Refund, 50, "refund");
        let folded: i64 = [top_up, deduct, refund].iter().map(|t| t.signed_amount()).sum();
        assert_eq!(folded, 350);
    }

    #[test]
    fn kind_serializes_as_type() {
        let tx = WalletTransaction::new(Uuid::new_v4(), TransactionType::TopUp, 10, "x")
            .with_reference("booking-1");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "top_up");
        assert_eq!(json["reference"], "booking-1");
    }
}
