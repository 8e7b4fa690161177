//! Symmetric encryption for group articles.
//!
//! Articles are encrypted with ChaCha20-Poly1305 under one content key
//! that is injected by the caller and fixed for the lifetime of the
//! vault. Every ciphertext is paired with the 96-bit IV it was produced
//! under; the pair is only meaningful together.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::{PermsError, Result};

/// Length of a content IV in bytes.
pub const IV_LEN: usize = 12;

/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Ciphertext length produced for a plaintext of `plaintext_len` bytes.
pub const fn ciphertext_len(plaintext_len: usize) -> usize {
    plaintext_len + TAG_LEN
}

/// The symmetric cipher provider consumed by the content vault.
///
/// Implementations hold their key for the process lifetime.
pub trait SymmetricCipher: Send + Sync {
    /// Encrypt `plaintext` under `iv`.
    fn encrypt(&self, plaintext: &[u8], iv: &ContentIv) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` that was produced under `iv`.
    fn decrypt(&self, ciphertext: &[u8], iv: &ContentIv) -> Result<Vec<u8>>;
}

/// A 256-bit ChaCha20-Poly1305 key.
#[derive(Clone)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| PermsError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PermsError::InvalidKey("expected 32 bytes".into()))?;
        Ok(Self(bytes))
    }

    /// Short, non-reversible identifier for logs.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::derive_key("helpvault-perms v1 key fingerprint", &self.0);
        hex::encode(&digest[..4])
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(&self.0).map_err(|e| PermsError::InvalidKey(e.to_string()))
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.fingerprint())
    }
}

impl SymmetricCipher for ContentKey {
    fn encrypt(&self, plaintext: &[u8], iv: &ContentIv) -> Result<Vec<u8>> {
        let cipher = self
            .cipher()
            .map_err(|e| PermsError::EncryptionError(e.to_string()))?;

        cipher
            .encrypt(Nonce::from_slice(&iv.0), plaintext)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &[u8], iv: &ContentIv) -> Result<Vec<u8>> {
        let cipher = self
            .cipher()
            .map_err(|e| PermsError::DecryptionError(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(&iv.0), ciphertext)
            .map_err(|e| PermsError::DecryptionError(e.to_string()))
    }
}

/// A 96-bit initialization vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentIv(pub [u8; IV_LEN]);

impl ContentIv {
    /// Draw a fresh IV from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive an IV deterministically from the plaintext.
    ///
    /// Identical plaintexts yield identical IVs (and, under one key,
    /// identical ciphertexts), so this leaks plaintext equality.
    pub fn derive_from_plaintext(plaintext: &[u8]) -> Self {
        let digest = blake3::derive_key("helpvault-perms v1 article iv", plaintext);
        let mut bytes = [0u8; IV_LEN];
        bytes.copy_from_slice(&digest[..IV_LEN]);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; IV_LEN] = bytes.try_into().map_err(|_| {
            PermsError::CorruptRecord(format!("IV is {} bytes, expected {IV_LEN}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// How the vault picks the IV for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IvStrategy {
    /// Fresh random IV per write.
    #[default]
    Random,
    /// IV derived from the plaintext bytes; reproducible ciphertexts.
    DerivedFromPlaintext,
}

impl IvStrategy {
    /// Produce the IV for encrypting `plaintext`.
    pub fn iv_for(&self, plaintext: &[u8]) -> ContentIv {
        match self {
            IvStrategy::Random => ContentIv::generate(),
            IvStrategy::DerivedFromPlaintext => ContentIv::derive_from_plaintext(plaintext),
        }
    }
}
