//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including the referential checks between groups and the rows that
//! reference them, but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use helpvault_core::{
    ArticleId, Credential, Group, GroupId, GroupPermission, HelpArticle, Invitation,
    InvitationCode, NewHelpArticle, PermissionKind, Profile, RoleSet, SealedArticle, User,
    Username,
};

use crate::error::{Result, StoreError};
use crate::traits::{
    CascadeReport, CreateGroupOutcome, GrantPlan, InsertResult, RedeemOutcome, RoleEdit,
    RoleEditOutcome, Store,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// every atomic unit runs under a single write guard.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: BTreeMap<Username, User>,

    /// Invitations keyed by code text.
    invitations: HashMap<String, Invitation>,

    groups: BTreeMap<GroupId, Group>,

    /// Last assigned group id; ids are never reused.
    last_group_id: i64,

    /// Permission matrix rows.
    permissions: BTreeSet<(GroupId, Username, PermissionKind)>,

    articles: BTreeMap<(GroupId, ArticleId), SealedArticle>,

    help: BTreeMap<i64, HelpArticle>,
    last_help_id: i64,
}

impl MemoryStoreInner {
    fn require_group(&self, group: GroupId) -> Result<()> {
        if self.groups.contains_key(&group) {
            Ok(())
        } else {
            Err(StoreError::ReferentialViolation(format!(
                "{group} does not exist"
            )))
        }
    }

    fn insert_permission(
        &mut self,
        group: GroupId,
        user: &Username,
        kind: PermissionKind,
    ) -> Result<InsertResult> {
        self.require_group(group)?;
        if self.permissions.insert((group, user.clone(), kind)) {
            Ok(InsertResult::Inserted)
        } else {
            Ok(InsertResult::AlreadyExists)
        }
    }

    fn group_has_admin(&self, group: GroupId) -> bool {
        self.permissions
            .iter()
            .any(|(g, _, k)| *g == group && *k == PermissionKind::Admin)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<InsertResult> {
        let mut inner = self.write()?;
        if inner.users.contains_key(&user.username) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_user(&self, username: &Username) -> Result<Option<User>> {
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn user_exists(&self, username: &Username) -> Result<bool> {
        Ok(self.read()?.users.contains_key(username))
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.read()?.users.len() as u64)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn edit_roles(&self, username: &Username, edit: &RoleEdit) -> Result<RoleEditOutcome> {
        let mut inner = self.write()?;
        let Some(user) = inner.users.get_mut(username) else {
            return Ok(RoleEditOutcome::UnknownUser);
        };

        // Edit a copy so a refused edit leaves the stored set untouched
        let mut roles = user.roles.clone();
        match edit.apply(&mut roles) {
            Ok(true) => {
                user.roles = roles.clone();
                Ok(RoleEditOutcome::Changed(roles))
            }
            Ok(false) => Ok(RoleEditOutcome::Unchanged),
            Err(e) => Ok(RoleEditOutcome::Rejected(e)),
        }
    }

    async fn reset(&self) -> Result<()> {
        *self.write()? = MemoryStoreInner::default();
        Ok(())
    }

    async fn update_profile(&self, username: &Username, profile: &Profile) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.users.get_mut(username) {
            Some(user) => {
                user.profile = profile.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, username: &Username) -> Result<bool> {
        let mut inner = self.write()?;
        inner.permissions.retain(|(_, u, _)| u != username);
        Ok(inner.users.remove(username).is_some())
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<InsertResult> {
        let mut inner = self.write()?;
        let key = invitation.code.as_str().to_string();
        if inner.invitations.contains_key(&key) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.invitations.insert(key, invitation.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_invitation(&self, code: &InvitationCode) -> Result<Option<Invitation>> {
        Ok(self.read()?.invitations.get(code.as_str()).cloned())
    }

    async fn delete_invitation(&self, code: &InvitationCode) -> Result<bool> {
        Ok(self.write()?.invitations.remove(code.as_str()).is_some())
    }

    async fn redeem_invitation(
        &self,
        code: &InvitationCode,
        username: &Username,
        credential: &Credential,
        now: i64,
    ) -> Result<RedeemOutcome> {
        let mut inner = self.write()?;

        let Some(invitation) = inner.invitations.get(code.as_str()) else {
            return Ok(RedeemOutcome::UnknownCode);
        };
        if inner.users.contains_key(username) {
            return Ok(RedeemOutcome::UsernameTaken);
        }

        let roles = RoleSet::single(&invitation.role)
            .map_err(|e| StoreError::InvalidData(format!("invitation role: {e}")))?;
        let user = User::new(username.clone(), credential.clone(), roles, now);

        inner.invitations.remove(code.as_str());
        inner.users.insert(username.clone(), user.clone());

        Ok(RedeemOutcome::Redeemed(user))
    }

    async fn create_group(
        &self,
        name: &str,
        creator: &Username,
        creator_grants: &[PermissionKind],
        now: i64,
    ) -> Result<CreateGroupOutcome> {
        let mut inner = self.write()?;

        if inner.groups.values().any(|g| g.name == name) {
            return Ok(CreateGroupOutcome::NameTaken);
        }

        inner.last_group_id += 1;
        let group = Group {
            id: GroupId(inner.last_group_id),
            name: name.to_string(),
            creator: creator.clone(),
            created_at: now,
        };
        inner.groups.insert(group.id, group.clone());

        for &kind in creator_grants {
            inner.insert_permission(group.id, creator, kind)?;
        }

        Ok(CreateGroupOutcome::Created(group))
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        Ok(self
            .read()?
            .groups
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.read()?.groups.values().cloned().collect())
    }

    async fn delete_group_cascade(&self, id: GroupId) -> Result<Option<CascadeReport>> {
        let mut inner = self.write()?;

        if !inner.groups.contains_key(&id) {
            return Ok(None);
        }

        let before = inner.permissions.len();
        inner.permissions.retain(|(g, _, _)| *g != id);
        let permissions = before - inner.permissions.len();

        let before = inner.articles.len();
        inner.articles.retain(|(g, _), _| *g != id);
        let articles = before - inner.articles.len();

        inner.groups.remove(&id);

        Ok(Some(CascadeReport {
            permissions,
            articles,
        }))
    }

    async fn insert_permission(&self, permission: &GroupPermission) -> Result<InsertResult> {
        self.write()?
            .insert_permission(permission.group, &permission.user, permission.kind)
    }

    async fn delete_permission(&self, permission: &GroupPermission) -> Result<bool> {
        let key = (permission.group, permission.user.clone(), permission.kind);
        Ok(self.write()?.permissions.remove(&key))
    }

    async fn has_permission(&self, permission: &GroupPermission) -> Result<bool> {
        let key = (permission.group, permission.user.clone(), permission.kind);
        Ok(self.read()?.permissions.contains(&key))
    }

    async fn list_permissions(&self, group: GroupId) -> Result<Vec<GroupPermission>> {
        Ok(self
            .read()?
            .permissions
            .iter()
            .filter(|(g, _, _)| *g == group)
            .map(|(g, u, k)| GroupPermission {
                group: *g,
                user: u.clone(),
                kind: *k,
            })
            .collect())
    }

    async fn list_group_members(
        &self,
        group: GroupId,
        kind: PermissionKind,
    ) -> Result<Vec<Username>> {
        Ok(self
            .read()?
            .permissions
            .iter()
            .filter(|(g, _, k)| *g == group && *k == kind)
            .map(|(_, u, _)| u.clone())
            .collect())
    }

    async fn list_user_groups(
        &self,
        user: &Username,
        kind: PermissionKind,
    ) -> Result<Vec<GroupId>> {
        let groups: BTreeSet<GroupId> = self
            .read()?
            .permissions
            .iter()
            .filter(|(_, u, k)| u == user && *k == kind)
            .map(|(g, _, _)| *g)
            .collect();
        Ok(groups.into_iter().collect())
    }

    async fn grant_planned(
        &self,
        group: GroupId,
        user: &Username,
        plan: GrantPlan,
    ) -> Result<Vec<PermissionKind>> {
        let mut inner = self.write()?;
        inner.require_group(group)?;

        let mut granted = Vec::new();
        for &kind in plan(inner.group_has_admin(group)) {
            if inner.insert_permission(group, user, kind)? == InsertResult::Inserted {
                granted.push(kind);
            }
        }
        Ok(granted)
    }

    async fn upsert_sealed_article(&self, article: &SealedArticle) -> Result<()> {
        let mut inner = self.write()?;
        inner.require_group(article.group)?;
        inner
            .articles
            .insert((article.group, article.article), article.clone());
        Ok(())
    }

    async fn get_sealed_article(
        &self,
        group: GroupId,
        article: ArticleId,
    ) -> Result<Option<SealedArticle>> {
        Ok(self.read()?.articles.get(&(group, article)).cloned())
    }

    async fn list_sealed_articles(&self, group: Option<GroupId>) -> Result<Vec<SealedArticle>> {
        Ok(self
            .read()?
            .articles
            .values()
            .filter(|a| group.map_or(true, |g| a.group == g))
            .cloned()
            .collect())
    }

    async fn delete_sealed_article(&self, group: GroupId, article: ArticleId) -> Result<bool> {
        Ok(self.write()?.articles.remove(&(group, article)).is_some())
    }

    async fn insert_help_article(
        &self,
        item: &NewHelpArticle,
        now: i64,
    ) -> Result<Option<HelpArticle>> {
        let mut inner = self.write()?;

        if inner.help.values().any(|h| h.title == item.title) {
            return Ok(None);
        }

        inner.last_help_id += 1;
        let stored = HelpArticle {
            id: inner.last_help_id,
            title: item.title.clone(),
            description: item.description.clone(),
            short_description: item.short_description.clone(),
            authors: item.authors.clone(),
            keywords: item.keywords.clone(),
            references: item.references.clone(),
            level: item.level.clone(),
            group_name: item.group_name.clone(),
            created_at: now,
        };
        inner.help.insert(stored.id, stored.clone());

        Ok(Some(stored))
    }

    async fn get_help_article(&self, title: &str) -> Result<Option<HelpArticle>> {
        Ok(self
            .read()?
            .help
            .values()
            .find(|h| h.title == title)
            .cloned())
    }

    async fn list_help_articles(&self) -> Result<Vec<HelpArticle>> {
        Ok(self.read()?.help.values().cloned().collect())
    }

    async fn delete_help_article(&self, title: &str) -> Result<bool> {
        let mut inner = self.write()?;
        let id = inner
            .help
            .values()
            .find(|h| h.title == title)
            .map(|h| h.id);
        Ok(id.and_then(|id| inner.help.remove(&id)).is_some())
    }
}
