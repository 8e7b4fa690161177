//! Error types for Help Vault operations.

use helpvault_core::CoreError;
use helpvault_perms::PermsError;
use helpvault_store::StoreError;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A unique identity (username, group name, help title, code) is taken.
    #[error("already exists: {0}")]
    DuplicateIdentity(String),

    /// The named user, group, article or invitation does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requester lacks the required permission.
    ///
    /// Carries no detail so callers cannot learn whether the resource exists.
    #[error("access denied")]
    AccessDenied,

    /// A stored `iv:ciphertext` pair is malformed or fails authentication.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// A write or delete broke group referential integrity.
    #[error("referential integrity violated: {0}")]
    ReferentialViolation(String),

    /// The persistence collaborator failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Validation error.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CoreError),

    /// Encryption failed on the write path.
    #[error("crypto error: {0}")]
    Crypto(PermsError),

    /// Writing a backup export failed.
    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => VaultError::DuplicateIdentity(detail),
            StoreError::ReferentialViolation(detail) => VaultError::ReferentialViolation(detail),
            other => VaultError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<PermsError> for VaultError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::CorruptRecord(detail) => VaultError::CorruptRecord(detail),
            PermsError::DecryptionError(detail) => VaultError::CorruptRecord(detail),
            other => VaultError::Crypto(other),
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
