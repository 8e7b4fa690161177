//! # Help Vault
//!
//! The access-control and encrypted-content core of a help-article
//! application.
//!
//! ## Overview
//!
//! Help Vault provides:
//!
//! - **Credential Store**: accounts with a role set and a verbatim credential
//! - **Invitation Registry**: single-use codes that admit one account each
//! - **Permission Matrix**: independent ADMIN and VIEW grants per group
//! - **Group Lifecycle**: creation with bootstrap grants, ordered cascading delete
//! - **Encrypted Content Vault**: per-article encryption, decrypted only after
//!   a VIEW check succeeds
//! - **Help Catalogue** and **Backup** export for plaintext help items
//!
//! ## Key Concepts
//!
//! - **Bootstrap invariant**: a group's creator starts with ADMIN and VIEW.
//! - **First-instructor rule**: the first instructor added to a group with no
//!   administrator receives ADMIN as well as VIEW.
//! - **Check-before-decrypt**: `AccessDenied` is returned before any stored
//!   ciphertext is loaded or decrypted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use helpvault::{HelpVault, VaultConfig};
//! use helpvault::core::{ArticleId, Username};
//! use helpvault::perms::ContentKey;
//! use helpvault::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("vault.db").unwrap();
//!     let vault = HelpVault::new(store, ContentKey::generate(), VaultConfig::default());
//!
//!     let alice = Username::new("alice").unwrap();
//!     let group = vault.groups().create_group("CS101", &alice).await.unwrap();
//!
//!     vault
//!         .content()
//!         .put_article(group.id, ArticleId(1), b"Lecture notes", &alice)
//!         .await
//!         .unwrap();
//!
//!     let notes = vault
//!         .content()
//!         .get_article_content(group.id, ArticleId(1), &alice)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `helpvault::core` - Domain types (Username, RoleSet, Group, ...)
//! - `helpvault::store` - Storage abstraction and SQLite
//! - `helpvault::perms` - Permission rules and encryption

pub mod backup;
pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod groups;
pub mod help;
pub mod invitations;
pub mod matrix;
pub mod vault;

// Re-export component crates
pub use helpvault_core as core;
pub use helpvault_perms as perms;
pub use helpvault_store as store;

pub use backup::{BackupExporter, BackupReport};
pub use config::VaultConfig;
pub use content::ContentVault;
pub use credentials::CredentialStore;
pub use error::{Result, VaultError};
pub use groups::GroupManager;
pub use help::HelpCatalogue;
pub use invitations::InvitationRegistry;
pub use matrix::PermissionMatrix;
pub use vault::HelpVault;

// Re-export commonly used core types
pub use helpvault_core::{
    ArticleId, Group, GroupId, InvitationCode, PermissionKind, Role, User, Username,
};
