//! The HelpVault: unified API over the access-control components.
//!
//! The vault owns the store, the injected cipher and the configuration,
//! and hands out the component views that share them.

use std::sync::Arc;

use helpvault_perms::SymmetricCipher;
use helpvault_store::Store;

use crate::backup::BackupExporter;
use crate::config::VaultConfig;
use crate::content::ContentVault;
use crate::credentials::CredentialStore;
use crate::groups::GroupManager;
use crate::help::HelpCatalogue;
use crate::invitations::InvitationRegistry;
use crate::matrix::PermissionMatrix;

/// The main HelpVault struct.
///
/// Provides a unified API for:
/// - Registering and authenticating users
/// - Issuing and redeeming invitation codes
/// - Managing group permissions
/// - Creating and deleting groups
/// - Reading and writing encrypted group articles
/// - Maintaining the public help catalogue and exporting backups
pub struct HelpVault<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: VaultConfig,
    credentials: CredentialStore<S>,
    invitations: InvitationRegistry<S>,
    matrix: PermissionMatrix<S>,
    groups: GroupManager<S>,
    content: ContentVault<S>,
    help: HelpCatalogue<S>,
    backup: BackupExporter<S>,
}

impl<S: Store> HelpVault<S> {
    /// Create a vault over `store`, encrypting articles with `cipher`.
    pub fn new<C>(store: S, cipher: C, config: VaultConfig) -> Self
    where
        C: SymmetricCipher + 'static,
    {
        Self::with_shared(Arc::new(store), Arc::new(cipher), config)
    }

    /// Create a vault over an already shared store and cipher.
    pub fn with_shared(store: Arc<S>, cipher: Arc<dyn SymmetricCipher>, config: VaultConfig) -> Self {
        let credentials = CredentialStore::new(store.clone(), config.password_policy.clone());
        let invitations = InvitationRegistry::new(
            store.clone(),
            credentials.clone(),
            config.invitation_code_len,
        );
        let matrix = PermissionMatrix::new(store.clone());
        let groups = GroupManager::new(store.clone(), matrix.clone());
        let content = ContentVault::new(
            store.clone(),
            matrix.clone(),
            cipher,
            config.iv_strategy,
            config.require_admin_for_writes,
        );
        let help = HelpCatalogue::new(store.clone());
        let backup = BackupExporter::new(store.clone());

        tracing::debug!(?config, "vault initialized");

        Self {
            store,
            config,
            credentials,
            invitations,
            matrix,
            groups,
            content,
            help,
            backup,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    pub fn invitations(&self) -> &InvitationRegistry<S> {
        &self.invitations
    }

    pub fn permissions(&self) -> &PermissionMatrix<S> {
        &self.matrix
    }

    pub fn groups(&self) -> &GroupManager<S> {
        &self.groups
    }

    pub fn content(&self) -> &ContentVault<S> {
        &self.content
    }

    pub fn help(&self) -> &HelpCatalogue<S> {
        &self.help
    }

    pub fn backup(&self) -> &BackupExporter<S> {
        &self.backup
    }
}
