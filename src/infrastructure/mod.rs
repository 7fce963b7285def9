//! Infrastructure layer - external concerns

pub mod database;
pub mod recognition;
pub mod storage;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use recognition::ManualPlateReader;
pub use storage::InMemoryRepositoryProvider;
