//! Sealed article envelope.
//!
//! A sealed article is the pair (IV, ciphertext). At rest it is stored as
//! one text column: `base64(iv) ":" base64(ciphertext)`, both halves in the
//! standard alphabet with padding. The colon never occurs in that alphabet,
//! so the split is unambiguous.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::crypto::{ContentIv, IvStrategy, SymmetricCipher};
use crate::error::{PermsError, Result};

/// Separator between the IV and ciphertext halves.
pub const PAIR_DELIMITER: char = ':';

/// An IV together with the ciphertext it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedContent {
    pub iv: ContentIv,
    /// Ciphertext including the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl SealedContent {
    /// Encrypt `plaintext`, choosing the IV with `strategy`.
    pub fn seal(
        cipher: &dyn SymmetricCipher,
        plaintext: &[u8],
        strategy: IvStrategy,
    ) -> Result<Self> {
        let iv = strategy.iv_for(plaintext);
        let ciphertext = cipher.encrypt(plaintext, &iv)?;
        Ok(Self { iv, ciphertext })
    }

    /// Decrypt with the IV stored alongside the ciphertext.
    pub fn open(&self, cipher: &dyn SymmetricCipher) -> Result<Vec<u8>> {
        cipher.decrypt(&self.ciphertext, &self.iv)
    }

    /// Text form for storage.
    pub fn encode(&self) -> String {
        format!(
            "{}{PAIR_DELIMITER}{}",
            STANDARD.encode(self.iv.as_bytes()),
            STANDARD.encode(&self.ciphertext)
        )
    }

    /// Parse the stored text form.
    pub fn decode(text: &str) -> Result<Self> {
        let (iv_b64, ct_b64) = text
            .split_once(PAIR_DELIMITER)
            .ok_or_else(|| PermsError::CorruptRecord("missing IV delimiter".into()))?;

        let iv_bytes = STANDARD
            .decode(iv_b64)
            .map_err(|e| PermsError::CorruptRecord(format!("IV: {e}")))?;
        let iv = ContentIv::from_slice(&iv_bytes)?;

        let ciphertext = STANDARD
            .decode(ct_b64)
            .map_err(|e| PermsError::CorruptRecord(format!("ciphertext: {e}")))?;

        Ok(Self { iv, ciphertext })
    }
}
