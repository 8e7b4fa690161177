//! Invitation codes.
//!
//! An invitation is a random token pre-bound to a role. Presence of the
//! record is validity: consuming a code deletes it.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default token length.
pub const DEFAULT_CODE_LEN: usize = 10;

const MAX_CODE_LEN: usize = 64;

/// A single-use onboarding token (`[A-Za-z0-9]+`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvitationCode(String);

impl InvitationCode {
    /// Generate a fresh token of `len` characters from the OS CSPRNG.
    pub fn generate(len: usize) -> Self {
        let code: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(len.clamp(1, MAX_CODE_LEN))
            .map(char::from)
            .collect();
        Self(code)
    }

    /// Parse a token supplied by a user.
    pub fn parse(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(CoreError::InvalidInvitationCode(format!(
                "length must be 1..={MAX_CODE_LEN}"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidInvitationCode(
                "only ASCII letters and digits are allowed".into(),
            ));
        }
        Ok(Self(code))
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer secrets; keep them out of debug logs.
impl fmt::Debug for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(2).collect();
        write!(f, "InvitationCode({prefix}…)")
    }
}

impl fmt::Display for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InvitationCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<InvitationCode> for String {
    fn from(value: InvitationCode) -> Self {
        value.0
    }
}

/// A persisted, not yet consumed invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub code: InvitationCode,
    /// Role granted to the account created by redeeming this code.
    pub role: String,
    pub issued_at: i64,
}
