use std::fmt;

use thiserror::Error;

/// Which catalog collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Account,
    Category,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Account => write!(f, "account"),
            Entity::Category => write!(f, "category"),
        }
    }
}

/// Error type for every ledger operation.
///
/// `Storage` and `LockPoisoned` are storage-level failures; the others are
/// caller-correctable input errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{entity} '{name}' already exists")]
    DuplicateName { entity: Entity, name: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures of the underlying store rather than of the input.
    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::Storage(_) | LedgerError::LockPoisoned)
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
