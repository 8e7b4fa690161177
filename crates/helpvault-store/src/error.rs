//! Error types for the store module.

use rusqlite::ffi;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// A unique or primary key constraint rejected a write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected a write or delete.
    #[error("referential integrity violated: {0}")]
    ReferentialViolation(String),

    /// Column serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The store cannot be reached (poisoned lock, failed blocking task).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            let detail = || msg.clone().unwrap_or_else(|| code.to_string());
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::ReferentialViolation(detail())
                }
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::UniqueViolation(detail())
                }
                _ => {}
            }
        }
        if let rusqlite::Error::FromSqlConversionFailure(idx, _, source) = &err {
            return StoreError::InvalidData(format!("column {idx}: {source}"));
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
