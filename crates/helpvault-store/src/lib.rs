//! # Help Vault Store
//!
//! The persistence collaborator for Help Vault. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! allowing the vault to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`RedeemOutcome`] - Result of consuming an invitation code
//! - [`CascadeReport`] - Rows removed by a group delete
//!
//! ## Usage
//!
//! ```rust,no_run
//! use helpvault_core::{PermissionKind, Username};
//! use helpvault_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("vault.db").unwrap();
//!
//!     let alice = Username::new("alice").unwrap();
//!     let grants = [PermissionKind::Admin, PermissionKind::View];
//!     let created = store.create_group("CS101", &alice, &grants, 0).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Compare-and-delete redemption**: only one redeemer of a code succeeds
//! - **Ordered cascade**: permissions, then articles, then the group row
//! - **Foreign keys on**: writes against a missing group are rejected

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    CascadeReport, CreateGroupOutcome, GrantPlan, InsertResult, RedeemOutcome, RoleEdit,
    RoleEditOutcome, Store,
};
