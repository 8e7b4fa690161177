//! Store trait: the abstract interface for Help Vault persistence.
//!
//! This trait allows the vault to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use helpvault_core::{
    ArticleId, CoreError, Credential, Group, GroupId, GroupPermission, HelpArticle, Invitation,
    InvitationCode, NewHelpArticle, PermissionKind, Profile, RoleSet, SealedArticle, User,
    Username,
};

use crate::error::Result;

/// Result of inserting a row keyed by a natural identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Row was inserted.
    Inserted,
    /// A row with the same key already exists (not an error).
    AlreadyExists,
}

/// Outcome of redeeming an invitation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The account was created and the code consumed.
    Redeemed(User),
    /// No invitation with that code exists (never issued, or already consumed).
    UnknownCode,
    /// The username is taken. The code is left untouched.
    UsernameTaken,
}

/// Outcome of creating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateGroupOutcome {
    Created(Group),
    NameTaken,
}

/// Rows removed by a cascading group delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub permissions: usize,
    pub articles: usize,
}

/// A single-label change to a user's role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleEdit {
    Add(String),
    Remove(String),
}

impl RoleEdit {
    /// Apply to `roles`. Returns whether the set changed.
    pub fn apply(&self, roles: &mut RoleSet) -> helpvault_core::Result<bool> {
        match self {
            RoleEdit::Add(label) => roles.insert(label),
            RoleEdit::Remove(label) => roles.remove(label),
        }
    }
}

/// Outcome of editing a user's role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleEditOutcome {
    /// The set changed; carries the stored result.
    Changed(RoleSet),
    /// The label was already present (add) or absent (remove).
    Unchanged,
    UnknownUser,
    /// The edit was refused, e.g. it would empty the set. Nothing was written.
    Rejected(CoreError),
}

/// Decides which kinds to grant given whether the group already has an
/// administrator.
pub type GrantPlan = fn(bool) -> &'static [PermissionKind];

/// The Store trait: async interface for Help Vault persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic units**: `edit_roles`, `redeem_invitation`, `create_group`,
///   `grant_planned`, `delete_group_cascade` and `delete_user` each run as
///   one transaction.
/// - **Referential integrity**: permission and encrypted-article rows
///   reference their group. Writing against a missing group, or deleting a
///   group that still owns rows, fails with `ReferentialViolation`.
/// - **Idempotent inserts**: re-inserting an existing permission returns
///   `AlreadyExists`.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new user. Returns `AlreadyExists` if the username is taken.
    async fn insert_user(&self, user: &User) -> Result<InsertResult>;

    /// Get a user by username.
    async fn get_user(&self, username: &Username) -> Result<Option<User>>;

    /// Check if a user exists.
    async fn user_exists(&self, username: &Username) -> Result<bool>;

    /// Number of registered users.
    async fn count_users(&self) -> Result<u64>;

    /// All users, ordered by username.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Read, edit and write back a user's role set as one unit, so
    /// concurrent edits never overwrite each other.
    async fn edit_roles(&self, username: &Username, edit: &RoleEdit) -> Result<RoleEditOutcome>;

    /// Delete every row in every table, keeping the schema.
    async fn reset(&self) -> Result<()>;

    /// Replace a user's profile. Returns `false` if the user does not exist.
    async fn update_profile(&self, username: &Username, profile: &Profile) -> Result<bool>;

    /// Delete a user together with their permission rows.
    async fn delete_user(&self, username: &Username) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Invitation Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist an issued invitation.
    async fn insert_invitation(&self, invitation: &Invitation) -> Result<InsertResult>;

    /// Get an invitation by code.
    async fn get_invitation(&self, code: &InvitationCode) -> Result<Option<Invitation>>;

    /// Delete an invitation. Returns `false` if it did not exist.
    async fn delete_invitation(&self, code: &InvitationCode) -> Result<bool>;

    /// Consume an invitation and create the account it admits.
    ///
    /// Compare-and-delete: of several concurrent redeemers of one code,
    /// exactly one observes `Redeemed`.
    async fn redeem_invitation(
        &self,
        code: &InvitationCode,
        username: &Username,
        credential: &Credential,
        now: i64,
    ) -> Result<RedeemOutcome>;

    // ─────────────────────────────────────────────────────────────────────────
    // Group Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a group and grant `creator_grants` to its creator.
    async fn create_group(
        &self,
        name: &str,
        creator: &Username,
        creator_grants: &[PermissionKind],
        now: i64,
    ) -> Result<CreateGroupOutcome>;

    /// Get a group by id.
    async fn get_group(&self, id: GroupId) -> Result<Option<Group>>;

    /// Get a group by display name.
    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>>;

    /// All groups, ordered by id.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Delete permissions, then articles, then the group row.
    ///
    /// Returns `None` if the group does not exist.
    async fn delete_group_cascade(&self, id: GroupId) -> Result<Option<CascadeReport>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a permission row.
    async fn insert_permission(&self, permission: &GroupPermission) -> Result<InsertResult>;

    /// Delete a permission row. Returns `false` if it did not exist.
    async fn delete_permission(&self, permission: &GroupPermission) -> Result<bool>;

    /// Check if a permission row exists.
    async fn has_permission(&self, permission: &GroupPermission) -> Result<bool>;

    /// All permission rows of a group, ordered by username then kind.
    async fn list_permissions(&self, group: GroupId) -> Result<Vec<GroupPermission>>;

    /// Users holding `kind` on `group`, ordered.
    async fn list_group_members(&self, group: GroupId, kind: PermissionKind)
        -> Result<Vec<Username>>;

    /// Groups on which `user` holds `kind`, ordered.
    async fn list_user_groups(&self, user: &Username, kind: PermissionKind)
        -> Result<Vec<GroupId>>;

    /// Grant the kinds chosen by `plan`, evaluated against the group's
    /// current administrators inside the same transaction.
    ///
    /// Returns the kinds that were newly inserted.
    async fn grant_planned(
        &self,
        group: GroupId,
        user: &Username,
        plan: GrantPlan,
    ) -> Result<Vec<PermissionKind>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Encrypted Article Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace an encrypted article.
    async fn upsert_sealed_article(&self, article: &SealedArticle) -> Result<()>;

    /// Get an encrypted article.
    async fn get_sealed_article(
        &self,
        group: GroupId,
        article: ArticleId,
    ) -> Result<Option<SealedArticle>>;

    /// Encrypted articles of one group, or of every group.
    async fn list_sealed_articles(&self, group: Option<GroupId>) -> Result<Vec<SealedArticle>>;

    /// Delete an encrypted article. Returns `false` if it did not exist.
    async fn delete_sealed_article(&self, group: GroupId, article: ArticleId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Help Article Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a help item. Returns `None` if the title is taken.
    async fn insert_help_article(
        &self,
        item: &NewHelpArticle,
        now: i64,
    ) -> Result<Option<HelpArticle>>;

    /// Get a help item by title.
    async fn get_help_article(&self, title: &str) -> Result<Option<HelpArticle>>;

    /// All help items, ordered by id.
    async fn list_help_articles(&self) -> Result<Vec<HelpArticle>>;

    /// Delete a help item by title.
    async fn delete_help_article(&self, title: &str) -> Result<bool>;
}
