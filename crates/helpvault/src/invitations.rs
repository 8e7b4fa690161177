//! Invitation Registry: single-use onboarding codes bound to a role.
//!
//! A code is valid while its record exists. Redemption and invalidation
//! both delete the record, so a code can be consumed at most once.

use std::sync::Arc;

use helpvault_core::{now_millis, Credential, Invitation, InvitationCode, RoleSet, User, Username};
use helpvault_store::{InsertResult, RedeemOutcome, Store};

use crate::credentials::CredentialStore;
use crate::error::{Result, VaultError};

const ISSUE_ATTEMPTS: usize = 3;

pub struct InvitationRegistry<S> {
    store: Arc<S>,
    credentials: CredentialStore<S>,
    code_len: usize,
}

impl<S> Clone for InvitationRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            credentials: self.credentials.clone(),
            code_len: self.code_len,
        }
    }
}

impl<S: Store> InvitationRegistry<S> {
    pub fn new(store: Arc<S>, credentials: CredentialStore<S>, code_len: usize) -> Self {
        Self {
            store,
            credentials,
            code_len,
        }
    }

    /// Draw a fresh code without persisting it.
    pub fn generate_code(&self) -> InvitationCode {
        InvitationCode::generate(self.code_len)
    }

    /// Persist a pre-generated code bound to `role`.
    pub async fn invite(&self, code: &InvitationCode, role: &str) -> Result<()> {
        RoleSet::validate_label(role)?;
        let invitation = Invitation {
            code: code.clone(),
            role: role.to_string(),
            issued_at: now_millis(),
        };

        match self.store.insert_invitation(&invitation).await? {
            InsertResult::Inserted => {
                tracing::info!(?code, role, "invitation issued");
                Ok(())
            }
            InsertResult::AlreadyExists => {
                Err(VaultError::DuplicateIdentity(format!("invitation {code:?}")))
            }
        }
    }

    /// Generate and persist a code bound to `role`.
    pub async fn issue(&self, role: &str) -> Result<InvitationCode> {
        let mut last_err = None;
        for _ in 0..ISSUE_ATTEMPTS {
            let code = self.generate_code();
            match self.invite(&code, role).await {
                Ok(()) => return Ok(code),
                // Collision with an outstanding code; draw again
                Err(e @ VaultError::DuplicateIdentity(_)) => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| VaultError::DuplicateIdentity("invitation".into())))
    }

    /// True iff the code has been issued and not yet consumed.
    pub async fn is_valid(&self, code: &InvitationCode) -> Result<bool> {
        Ok(self.store.get_invitation(code).await?.is_some())
    }

    /// The role an outstanding code admits.
    pub async fn role_for(&self, code: &InvitationCode) -> Result<String> {
        self.store
            .get_invitation(code)
            .await?
            .map(|inv| inv.role)
            .ok_or_else(|| VaultError::NotFound(format!("invitation {code:?}")))
    }

    /// Consume a code and create the account it admits.
    ///
    /// Fails with `NotFound` if the code is unknown or already consumed,
    /// and with `DuplicateIdentity` if the username is taken (the code then
    /// stays valid).
    pub async fn redeem(
        &self,
        code: &InvitationCode,
        username: &Username,
        credential: &str,
    ) -> Result<User> {
        self.credentials.check_policy(credential)?;

        let outcome = self
            .store
            .redeem_invitation(code, username, &Credential::new(credential), now_millis())
            .await?;

        match outcome {
            RedeemOutcome::Redeemed(user) => {
                tracing::info!(?code, user = %username, roles = %user.roles, "invitation redeemed");
                Ok(user)
            }
            RedeemOutcome::UnknownCode => {
                tracing::warn!(?code, "redeem of unknown invitation");
                Err(VaultError::NotFound(format!("invitation {code:?}")))
            }
            RedeemOutcome::UsernameTaken => Err(VaultError::DuplicateIdentity(username.to_string())),
        }
    }

    /// Delete a code. Invalidating an absent code is a no-op.
    pub async fn invalidate(&self, code: &InvitationCode) -> Result<()> {
        if self.store.delete_invitation(code).await? {
            tracing::info!(?code, "invitation invalidated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpvault_core::{PasswordPolicy, Role};
    use helpvault_store::MemoryStore;

    fn registry(policy: Option<PasswordPolicy>) -> InvitationRegistry<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let credentials = CredentialStore::new(store.clone(), policy);
        InvitationRegistry::new(store, credentials, 10)
    }

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_issue_produces_valid_code() {
        let registry = registry(None);
        let code = registry.issue(Role::STUDENT).await.unwrap();

        assert_eq!(code.as_str().len(), 10);
        assert!(registry.is_valid(&code).await.unwrap());
        assert_eq!(registry.role_for(&code).await.unwrap(), Role::STUDENT);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let registry = registry(None);
        let code = registry.issue(Role::INSTRUCTOR).await.unwrap();

        registry.invalidate(&code).await.unwrap();
        registry.invalidate(&code).await.unwrap();
        assert!(!registry.is_valid(&code).await.unwrap());

        let err = registry
            .redeem(&code, &name("bob"), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_keeps_code_valid() {
        let registry = registry(None);
        let code = registry.issue(Role::STUDENT).await.unwrap();
        registry
            .credentials
            .register(&name("bob"), "pw", Role::ADMIN)
            .await
            .unwrap();

        let err = registry.redeem(&code, &name("bob"), "pw").await.unwrap_err();
        assert!(matches!(err, VaultError::DuplicateIdentity(_)));
        assert!(registry.is_valid(&code).await.unwrap());

        registry.redeem(&code, &name("bobby"), "pw").await.unwrap();
        assert!(!registry.is_valid(&code).await.unwrap());
    }

    #[tokio::test]
    async fn test_weak_credential_rejected_before_consuming() {
        let registry = registry(Some(PasswordPolicy::default()));
        let code = registry.issue(Role::STUDENT).await.unwrap();

        let err = registry.redeem(&code, &name("bob"), "pw1").await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
        assert!(registry.is_valid(&code).await.unwrap());
    }

    #[tokio::test]
    async fn test_invite_rejects_bad_role_and_duplicate_code() {
        let registry = registry(None);
        let code = InvitationCode::parse("ABCDEFGHIJ").unwrap();

        assert!(matches!(
            registry.invite(&code, "").await,
            Err(VaultError::InvalidInput(_))
        ));

        registry.invite(&code, Role::STUDENT).await.unwrap();
        assert!(matches!(
            registry.invite(&code, Role::ADMIN).await,
            Err(VaultError::DuplicateIdentity(_))
        ));
    }
}
