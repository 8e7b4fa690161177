//! Password policy applied at registration.
//!
//! The rules match the source registration form: at least eight
//! characters, one uppercase letter, one lowercase letter, and one of
//! `!@#$%^&*`. The policy is opt-in; without it any credential is accepted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Special characters accepted by the default policy.
pub const SPECIAL_CHARS: &str = "!@#$%^&*";

/// A rule the candidate credential failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyViolation {
    TooShort { min: usize },
    MissingUppercase,
    MissingLowercase,
    MissingSpecial,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::TooShort { min } => write!(f, "fewer than {min} characters"),
            PolicyViolation::MissingUppercase => f.write_str("no uppercase letter"),
            PolicyViolation::MissingLowercase => f.write_str("no lowercase letter"),
            PolicyViolation::MissingSpecial => {
                write!(f, "no special character ({SPECIAL_CHARS})")
            }
        }
    }
}

/// Credential strength rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Every rule `candidate` violates, in a stable order.
    pub fn violations(&self, candidate: &str) -> Vec<PolicyViolation> {
        let mut out = Vec::new();
        if candidate.chars().count() < self.min_len {
            out.push(PolicyViolation::TooShort { min: self.min_len });
        }
        if self.require_uppercase && !candidate.chars().any(|c| c.is_ascii_uppercase()) {
            out.push(PolicyViolation::MissingUppercase);
        }
        if self.require_lowercase && !candidate.chars().any(|c| c.is_ascii_lowercase()) {
            out.push(PolicyViolation::MissingLowercase);
        }
        if self.require_special && !candidate.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            out.push(PolicyViolation::MissingSpecial);
        }
        out
    }

    /// Accept or reject a candidate credential.
    pub fn check(&self, candidate: &str) -> Result<()> {
        let violations = self.violations(candidate);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::WeakCredential(violations))
        }
    }
}
