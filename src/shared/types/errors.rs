use thiserror::Error;

/// Coarse error category handed to callers (HTTP layer, CLI) for mapping
/// onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    InsufficientFunds,
    Unavailable,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid_input",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Unavailable => "unavailable",
            Self::Upstream => "upstream",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient funds: {required} points required, {available} available")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// A conditional write found the record in a different state than the
    /// preceding read. Retried internally, mapped before leaving a service.
    #[error("Lost conditional update on {0}")]
    ClaimLost(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) | Self::ClaimLost(_) => ErrorKind::Conflict,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// Whether this error is likely transient (store hiccup, lost race)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::ClaimLost(_))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, msg)
                })
            })
            .collect();
        field_errors.sort();

        if field_errors.is_empty() {
            DomainError::Validation("validation failed".to_string())
        } else {
            DomainError::Validation(field_errors.join("; "))
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        DomainError::Upstream(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(e) => e.kind(),
            Self::Infra(_) => ErrorKind::Upstream,
        }
    }
}
