//! # Help Vault Core
//!
//! Pure domain types for the Help Vault access-control core: users and their
//! role sets, invitation codes, special-access groups, the permission kinds
//! of the group matrix, and help articles.
//!
//! This crate contains no I/O, no storage, no cryptography. Everything here
//! is validation and plain data.
//!
//! ## Key Types
//!
//! - [`Username`] - Validated unique account identifier
//! - [`RoleSet`] - Non-empty set of free-form role labels
//! - [`Credential`] - Opaque secret, compared verbatim
//! - [`InvitationCode`] - Single-use onboarding token bound to a role
//! - [`PermissionKind`] - ADMIN or VIEW grant on a group
//! - [`Group`] - A special-access group owning encrypted articles

pub mod article;
pub mod error;
pub mod group;
pub mod invitation;
pub mod policy;
pub mod role;
pub mod types;
pub mod user;

pub use article::{HelpArticle, NewHelpArticle, SealedArticle};
pub use error::{CoreError, Result};
pub use group::{Group, GroupPermission, PermissionKind};
pub use invitation::{Invitation, InvitationCode, DEFAULT_CODE_LEN};
pub use policy::{PasswordPolicy, PolicyViolation};
pub use role::{Role, RoleSet};
pub use types::{now_millis, ArticleId, GroupId, Username};
pub use user::{Credential, Profile, User};
