//! Wallet aggregate

pub mod model;
pub mod repository;

pub use model::{DebitOutcome, TransactionType, Wallet, WalletTransaction};
pub use repository::WalletRepository;
