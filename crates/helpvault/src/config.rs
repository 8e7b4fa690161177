//! Vault configuration.

use helpvault_core::{PasswordPolicy, DEFAULT_CODE_LEN};
use helpvault_perms::IvStrategy;

/// Configuration for a [`HelpVault`](crate::HelpVault).
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// How article IVs are chosen.
    pub iv_strategy: IvStrategy,
    /// Length of generated invitation codes.
    pub invitation_code_len: usize,
    /// Credential rules applied on registration and redemption.
    /// `None` accepts any credential.
    pub password_policy: Option<PasswordPolicy>,
    /// Whether article writes and deletes need ADMIN (otherwise VIEW).
    pub require_admin_for_writes: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            iv_strategy: IvStrategy::Random,
            invitation_code_len: DEFAULT_CODE_LEN,
            password_policy: None,
            require_admin_for_writes: true,
        }
    }
}

impl VaultConfig {
    pub fn with_iv_strategy(mut self, strategy: IvStrategy) -> Self {
        self.iv_strategy = strategy;
        self
    }

    pub fn with_invitation_code_len(mut self, len: usize) -> Self {
        self.invitation_code_len = len;
        self
    }

    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = Some(policy);
        self
    }

    pub fn with_admin_writes(mut self, required: bool) -> Self {
        self.require_admin_for_writes = required;
        self
    }
}
