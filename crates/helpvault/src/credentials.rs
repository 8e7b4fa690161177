//! Credential Store: identities, role sets and verbatim credentials.
//!
//! Credentials are compared exactly as stored. Production deployments need
//! a salted slow hash; this module keeps the comparison behind
//! [`CredentialStore::authenticate`] so it can be swapped in one place.

use std::sync::Arc;

use helpvault_core::{
    now_millis, Credential, PasswordPolicy, Profile, Role, RoleSet, User, Username,
};
use helpvault_store::{InsertResult, RoleEdit, RoleEditOutcome, Store};

use crate::error::{Result, VaultError};

/// User identity operations.
pub struct CredentialStore<S> {
    store: Arc<S>,
    policy: Option<PasswordPolicy>,
}

impl<S> Clone for CredentialStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<S: Store> CredentialStore<S> {
    pub fn new(store: Arc<S>, policy: Option<PasswordPolicy>) -> Self {
        Self { store, policy }
    }

    /// Reject a credential that fails the configured policy.
    pub(crate) fn check_policy(&self, credential: &str) -> Result<()> {
        if let Some(policy) = &self.policy {
            policy.check(credential)?;
        }
        Ok(())
    }

    /// Whether an account exists.
    ///
    /// Storage failures propagate instead of reading as `false`.
    pub async fn exists(&self, username: &Username) -> Result<bool> {
        Ok(self.store.user_exists(username).await?)
    }

    /// Whether no account has been registered yet.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.store.count_users().await? == 0)
    }

    /// Create an account holding a single role.
    pub async fn register(&self, username: &Username, credential: &str, role: &str) -> Result<User> {
        self.check_policy(credential)?;
        let roles = RoleSet::single(role)?;
        let user = User::new(username.clone(), Credential::new(credential), roles, now_millis());

        match self.store.insert_user(&user).await? {
            InsertResult::Inserted => {
                tracing::info!(user = %username, role, "registered account");
                Ok(user)
            }
            InsertResult::AlreadyExists => Err(VaultError::DuplicateIdentity(username.to_string())),
        }
    }

    /// True iff the account exists and the credential matches exactly.
    pub async fn authenticate(&self, username: &Username, credential: &str) -> Result<bool> {
        let ok = self
            .store
            .get_user(username)
            .await?
            .is_some_and(|user| user.credential.matches(credential));

        if !ok {
            tracing::warn!(user = %username, "authentication failed");
        }
        Ok(ok)
    }

    /// Load an account.
    pub async fn lookup(&self, username: &Username) -> Result<User> {
        tracing::debug!(user = %username, "lookup");
        self.store
            .get_user(username)
            .await?
            .ok_or_else(|| VaultError::NotFound(username.to_string()))
    }

    /// All accounts, ordered by username.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    /// Add a role label. Returns `false` if the user already held it.
    pub async fn add_role(&self, username: &Username, role: &str) -> Result<bool> {
        RoleSet::validate_label(role)?;
        let changed = self.edit_roles(username, RoleEdit::Add(role.to_string())).await?;
        if changed {
            tracing::info!(user = %username, role, "role added");
        }
        Ok(changed)
    }

    /// Remove a role label by exact match. Returns `false` if it was not held.
    ///
    /// Removing the last role fails with `InvalidInput`.
    pub async fn remove_role(&self, username: &Username, role: &str) -> Result<bool> {
        let changed = self
            .edit_roles(username, RoleEdit::Remove(role.to_string()))
            .await?;
        if changed {
            tracing::info!(user = %username, role, "role removed");
        }
        Ok(changed)
    }

    async fn edit_roles(&self, username: &Username, edit: RoleEdit) -> Result<bool> {
        match self.store.edit_roles(username, &edit).await? {
            RoleEditOutcome::Changed(_) => Ok(true),
            RoleEditOutcome::Unchanged => Ok(false),
            RoleEditOutcome::UnknownUser => Err(VaultError::NotFound(username.to_string())),
            RoleEditOutcome::Rejected(e) => Err(VaultError::InvalidInput(e)),
        }
    }

    /// Fill in the profile after onboarding.
    pub async fn complete_profile(&self, username: &Username, profile: Profile) -> Result<User> {
        if !self.store.update_profile(username, &profile).await? {
            return Err(VaultError::NotFound(username.to_string()));
        }
        tracing::info!(user = %username, complete = profile.is_complete(), "profile updated");
        self.lookup(username).await
    }

    /// Wipe every account, invitation, group, permission and article.
    ///
    /// `actor` must be an existing account holding the Admin role.
    pub async fn reset_database(&self, actor: &Username) -> Result<()> {
        let admin = self
            .store
            .get_user(actor)
            .await?
            .is_some_and(|user| user.has_role(Role::ADMIN));
        if !admin {
            tracing::warn!(user = %actor, "reset refused");
            return Err(VaultError::AccessDenied);
        }

        self.store.reset().await?;
        tracing::warn!(user = %actor, "database reset");
        Ok(())
    }

    /// Delete an account and every permission it holds.
    pub async fn delete_account(&self, username: &Username) -> Result<()> {
        if !self.store.delete_user(username).await? {
            return Err(VaultError::NotFound(username.to_string()));
        }
        tracing::info!(user = %username, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpvault_store::{MemoryStore, SqliteStore};

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    fn credentials() -> CredentialStore<MemoryStore> {
        CredentialStore::new(Arc::new(MemoryStore::new()), None)
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let creds = credentials();
        assert!(creds.is_empty().await.unwrap());

        creds.register(&name("alice"), "pw", Role::ADMIN).await.unwrap();
        assert!(creds.exists(&name("alice")).await.unwrap());
        assert!(creds.authenticate(&name("alice"), "pw").await.unwrap());
        assert!(!creds.authenticate(&name("alice"), "PW").await.unwrap());
        assert!(!creds.authenticate(&name("nobody"), "pw").await.unwrap());
        assert!(!creds.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let creds = credentials();
        creds.register(&name("alice"), "pw", Role::ADMIN).await.unwrap();

        let err = creds
            .register(&name("alice"), "other", Role::STUDENT)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::DuplicateIdentity(_)));
    }

    #[tokio::test]
    async fn test_lookup_missing_user() {
        let err = credentials().lookup(&name("ghost")).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_role_edits() {
        let creds = credentials();
        creds
            .register(&name("sam"), "pw", "SuperAdmin")
            .await
            .unwrap();

        assert!(creds.add_role(&name("sam"), Role::STUDENT).await.unwrap());
        assert!(!creds.add_role(&name("sam"), Role::STUDENT).await.unwrap());

        // exact-label removal leaves SuperAdmin alone
        assert!(!creds.remove_role(&name("sam"), Role::ADMIN).await.unwrap());
        assert!(creds.remove_role(&name("sam"), Role::STUDENT).await.unwrap());

        let err = creds.remove_role(&name("sam"), "SuperAdmin").await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));

        let sam = creds.lookup(&name("sam")).await.unwrap();
        assert!(sam.has_role("SuperAdmin"));
        assert_eq!(sam.roles.len(), 1);
    }

    #[tokio::test]
    async fn test_policy_enforced_when_configured() {
        let creds = CredentialStore::new(
            Arc::new(MemoryStore::new()),
            Some(PasswordPolicy::default()),
        );

        let err = creds
            .register(&name("bob"), "pw1", Role::STUDENT)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));

        creds
            .register(&name("bob"), "Passw0rd!", Role::STUDENT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_profile_and_deletion() {
        let creds = credentials();
        creds.register(&name("bob"), "pw", Role::STUDENT).await.unwrap();
        assert!(creds.lookup(&name("bob")).await.unwrap().needs_profile());

        let profile = Profile {
            email: Some("bob@example.edu".into()),
            first_name: Some("Bob".into()),
            ..Profile::default()
        };
        let bob = creds.complete_profile(&name("bob"), profile).await.unwrap();
        assert!(!bob.needs_profile());

        creds.delete_account(&name("bob")).await.unwrap();
        assert!(matches!(
            creds.delete_account(&name("bob")).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_role_adds_are_not_lost() {
        let creds = CredentialStore::new(Arc::new(SqliteStore::open_memory().unwrap()), None);
        creds.register(&name("sam"), "pw", Role::STUDENT).await.unwrap();

        for round in 0..10 {
            let mut handles = Vec::new();
            for i in 0..8 {
                let creds = creds.clone();
                handles.push(tokio::spawn(async move {
                    creds.add_role(&name("sam"), &format!("R{round}x{i}")).await
                }));
            }
            for handle in handles {
                assert!(handle.await.unwrap().unwrap());
            }

            let sam = creds.lookup(&name("sam")).await.unwrap();
            for i in 0..8 {
                assert!(sam.has_role(&format!("R{round}x{i}")), "round {round}: {}", sam.roles);
            }
        }
        assert_eq!(creds.lookup(&name("sam")).await.unwrap().roles.len(), 81);
    }

    #[tokio::test]
    async fn test_reset_requires_admin_role() {
        let creds = credentials();
        creds.register(&name("root"), "pw", Role::ADMIN).await.unwrap();
        creds.register(&name("carol"), "pw", Role::STUDENT).await.unwrap();

        assert!(matches!(
            creds.reset_database(&name("carol")).await,
            Err(VaultError::AccessDenied)
        ));
        assert!(matches!(
            creds.reset_database(&name("ghost")).await,
            Err(VaultError::AccessDenied)
        ));
        assert!(!creds.is_empty().await.unwrap());

        creds.reset_database(&name("root")).await.unwrap();
        assert!(creds.is_empty().await.unwrap());
    }
}
