//! User accounts.
//!
//! Credentials are stored and compared verbatim, matching the source
//! system. This is a known weakness: production use needs a salted,
//! slow hash and a constant-time comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::RoleSet;
use crate::types::Username;

/// An opaque secret, compared verbatim.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exact comparison against a candidate secret.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    /// Expose the secret for persistence.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

/// Optional profile fields, filled in after onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_first_name: Option<String>,
}

impl Profile {
    /// Whether the required fields (email, first name) are present.
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.email) && filled(&self.first_name)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: Username,
    pub credential: Credential,
    pub roles: RoleSet,
    pub profile: Profile,
    pub created_at: i64,
}

impl User {
    /// Create a freshly registered user with one role and an empty profile.
    pub fn new(username: Username, credential: Credential, roles: RoleSet, created_at: i64) -> Self {
        Self {
            username,
            credential,
            roles,
            profile: Profile::default(),
            created_at,
        }
    }

    /// Whether the account holds a role label.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Whether the user still has to complete their profile.
    pub fn needs_profile(&self) -> bool {
        !self.profile.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("hunter2");
        assert_eq!(format!("{cred:?}"), "Credential(<redacted>)");
        assert!(cred.matches("hunter2"));
        assert!(!cred.matches("Hunter2"));
    }

    #[test]
    fn test_profile_completion() {
        let mut profile = Profile::default();
        assert!(!profile.is_complete());

        profile.email = Some("bob@example.edu".into());
        assert!(!profile.is_complete());

        profile.first_name = Some("Robert".into());
        assert!(profile.is_complete());

        profile.first_name = Some("  ".into());
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_new_user_needs_profile() {
        let user = User::new(
            Username::new("bob").unwrap(),
            Credential::new("pw1"),
            RoleSet::single(Role::INSTRUCTOR).unwrap(),
            0,
        );
        assert!(user.needs_profile());
        assert!(user.has_role(Role::INSTRUCTOR));
        assert!(!user.has_role(Role::ADMIN));
    }
}
