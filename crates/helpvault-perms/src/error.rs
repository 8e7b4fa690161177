//! Error types for the permissions and encryption module.

use thiserror::Error;

/// Errors that can occur while sealing or opening article content.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error (wrong key, or ciphertext and IV do not belong together).
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// The stored `iv:ciphertext` text is malformed.
    #[error("corrupt sealed record: {0}")]
    CorruptRecord(String),

    /// Key material could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for permission and encryption operations.
pub type Result<T> = std::result::Result<T, PermsError>;
