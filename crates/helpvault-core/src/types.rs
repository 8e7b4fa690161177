//! Strong type definitions for Help Vault.
//!
//! Identifiers are newtypes so a group id can never be passed where an
//! article id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Maximum username length, matching the source column width.
const MAX_USERNAME_LEN: usize = 255;

/// A unique account identifier.
///
/// Usernames are non-empty, carry no surrounding whitespace, and contain no
/// control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and wrap a username.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidUsername("username is empty".into()));
        }
        if name.trim() != name {
            return Err(CoreError::InvalidUsername(format!(
                "{name:?} has surrounding whitespace"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(CoreError::InvalidUsername(format!(
                "{name:?} contains control characters"
            )));
        }
        if name.len() > MAX_USERNAME_LEN {
            return Err(CoreError::InvalidUsername(format!(
                "longer than {MAX_USERNAME_LEN} bytes"
            )));
        }
        Ok(Self(name))
    }

    /// Get the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Username {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a special-access group, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of an encrypted article within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "article#{}", self.0)
    }
}

impl From<i64> for ArticleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Get current time in milliseconds.
///
/// A clock before the Unix epoch reads as zero.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_accepts_plain_names() {
        let name = Username::new("alice").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert_eq!(name.to_string(), "alice");
    }

    #[test]
    fn test_username_rejects_empty_and_padded() {
        assert!(Username::new("").is_err());
        assert!(Username::new(" bob").is_err());
        assert!(Username::new("bob\n").is_err());
        assert!(Username::new("a\u{0007}b").is_err());
    }

    #[test]
    fn test_username_length_limit() {
        assert!(Username::new("x".repeat(255)).is_ok());
        assert!(Username::new("x".repeat(256)).is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(GroupId(7).to_string(), "group#7");
        assert_eq!(ArticleId(3).to_string(), "article#3");
    }
}
