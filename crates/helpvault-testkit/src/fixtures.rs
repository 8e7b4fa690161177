//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use helpvault::{HelpVault, VaultConfig};
use helpvault_core::{Group, GroupId, User, Username};
use helpvault_perms::{ContentKey, IvStrategy};
use helpvault_store::MemoryStore;
use rand::Rng;

/// Credential used by [`TestFixture::register`].
pub const FIXTURE_CREDENTIAL: &str = "Passw0rd!";

/// Parse a username, panicking on invalid input.
pub fn user(name: &str) -> Username {
    Username::new(name).unwrap_or_else(|e| panic!("bad fixture username {name:?}: {e}"))
}

/// A vault over a memory store with a known content key.
///
/// Articles are sealed with plaintext-derived IVs, so the stored text is
/// reproducible across runs with the same seed.
pub struct TestFixture {
    pub key_seed: [u8; 32],
    pub vault: HelpVault<MemoryStore>,
}

impl TestFixture {
    /// Create a new fixture with a random key.
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    /// Create with a deterministic key.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_config(seed, VaultConfig::default())
    }

    /// Create with a deterministic key and a custom configuration.
    ///
    /// The IV strategy is always forced to plaintext-derived.
    pub fn with_config(seed: [u8; 32], config: VaultConfig) -> Self {
        let config = config.with_iv_strategy(IvStrategy::DerivedFromPlaintext);
        Self {
            key_seed: seed,
            vault: HelpVault::new(MemoryStore::new(), ContentKey::from_bytes(seed), config),
        }
    }

    /// Hex form of the content key, for cross-checking sealed output.
    pub fn key_hex(&self) -> String {
        hex::encode(self.key_seed)
    }

    /// A second handle on the same key.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::from_bytes(self.key_seed)
    }

    /// Register `name` with [`FIXTURE_CREDENTIAL`] and a single role.
    pub async fn register(&self, name: &str, role: &str) -> User {
        self.vault
            .credentials()
            .register(&user(name), FIXTURE_CREDENTIAL, role)
            .await
            .unwrap_or_else(|e| panic!("register {name}: {e}"))
    }

    /// Create a group owned by `creator`.
    pub async fn group(&self, name: &str, creator: &User) -> Group {
        self.vault
            .groups()
            .create_group(name, &creator.username)
            .await
            .unwrap_or_else(|e| panic!("create group {name}: {e}"))
    }

    /// Grant VIEW on `group` to each of `viewers`.
    pub async fn with_viewers(&self, group: GroupId, viewers: &[&User]) {
        for viewer in viewers {
            self.vault
                .permissions()
                .grant(group, &viewer.username, helpvault_core::PermissionKind::View)
                .await
                .unwrap_or_else(|e| panic!("grant view to {}: {e}", viewer.username));
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures with distinct keys, for tests that compare vaults.
pub fn multi_vault_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
