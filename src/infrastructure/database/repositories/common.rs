//! Helpers shared by the SeaORM repositories

use sea_orm::{DbErr, SqlErr};

use crate::shared::errors::{DomainError, InfraError};

pub(super) fn db_err(e: DbErr) -> DomainError {
    InfraError::Database(e).into()
}

pub(super) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
