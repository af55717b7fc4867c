//! Error type shared by the store, the ledger and the export layer.
//!
//! The binary edge (`main` and the CLI handlers) wraps these in `anyhow`.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum LedgerError {
    /// The database file could not be opened or prepared. Fatal for the session.
    #[error("failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Unique, foreign-key or CHECK constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Self::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => Self::Storage(err),
        }
    }
}

impl LedgerError {
    pub(crate) fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

pub(crate) type Result<T, E = LedgerError> = std::result::Result<T, E>;
