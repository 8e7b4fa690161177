//! # Help Vault Testkit
//!
//! Testing utilities for Help Vault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a vault over an in-memory store with a fixed content key
//! - **Generators**: Proptest strategies for usernames, roles, codes and plaintexts
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,ignore
//! use helpvault_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = fixture.register("alice", "Instructor").await;
//! let group = fixture.group("CS101", &alice).await;
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use helpvault_testkit::generators::{plaintext, username};
//!
//! proptest! {
//!     #[test]
//!     fn any_username_round_trips(name in username()) {
//!         prop_assert_eq!(name.to_string(), name.as_str());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_vault_fixtures, user, TestFixture, FIXTURE_CREDENTIAL};
