//! Permission Matrix: per-group ADMIN and VIEW grants.
//!
//! The two kinds are independent; granting one never grants the other.
//! The only compound grant is the first-instructor rule in
//! [`PermissionMatrix::add_instructor`].

use std::collections::BTreeSet;
use std::sync::Arc;

use helpvault_core::{CoreError, GroupId, GroupPermission, PermissionKind, Role, Username};
use helpvault_perms::{instructor_grants, GroupOperation, GroupRoster};
use helpvault_store::{InsertResult, Store};

use crate::error::{Result, VaultError};

pub struct PermissionMatrix<S> {
    store: Arc<S>,
}

impl<S> Clone for PermissionMatrix<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

fn row(group: GroupId, user: &Username, kind: PermissionKind) -> GroupPermission {
    GroupPermission {
        group,
        user: user.clone(),
        kind,
    }
}

impl<S: Store> PermissionMatrix<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `kind` to `user` on `group`. Idempotent.
    ///
    /// Returns `true` if the grant is new.
    pub async fn grant(&self, group: GroupId, user: &Username, kind: PermissionKind) -> Result<bool> {
        let inserted = self
            .store
            .insert_permission(&row(group, user, kind))
            .await
            .map_err(|e| match VaultError::from(e) {
                VaultError::ReferentialViolation(_) => VaultError::NotFound(group.to_string()),
                other => other,
            })?;

        let new = inserted == InsertResult::Inserted;
        if new {
            tracing::info!(%group, user = %user, %kind, "permission granted");
        }
        Ok(new)
    }

    /// Revoke `kind` from `user` on `group`. Idempotent.
    ///
    /// Returns `true` if a grant was removed.
    pub async fn revoke(&self, group: GroupId, user: &Username, kind: PermissionKind) -> Result<bool> {
        let removed = self.store.delete_permission(&row(group, user, kind)).await?;
        if removed {
            tracing::info!(%group, user = %user, %kind, "permission revoked");
        }
        Ok(removed)
    }

    /// Add an instructor to a group.
    ///
    /// The first instructor of a group without an administrator receives
    /// ADMIN and VIEW; otherwise only VIEW. Returns the kinds newly granted.
    ///
    /// `user` must be a registered account holding the Instructor role.
    pub async fn add_instructor(&self, group: GroupId, user: &Username) -> Result<Vec<PermissionKind>> {
        let account = self
            .store
            .get_user(user)
            .await?
            .ok_or_else(|| VaultError::NotFound(user.to_string()))?;
        if !account.has_role(Role::INSTRUCTOR) {
            return Err(VaultError::InvalidInput(CoreError::InvalidRole(format!(
                "{user} is not an instructor"
            ))));
        }

        let granted = self
            .store
            .grant_planned(group, user, instructor_grants)
            .await
            .map_err(|e| match VaultError::from(e) {
                VaultError::ReferentialViolation(_) => VaultError::NotFound(group.to_string()),
                other => other,
            })?;

        tracing::info!(%group, user = %user, ?granted, "instructor added");
        Ok(granted)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn has(&self, group: GroupId, user: &Username, kind: PermissionKind) -> Result<bool> {
        Ok(self.store.has_permission(&row(group, user, kind)).await?)
    }

    pub async fn list_admins(&self, group: GroupId) -> Result<BTreeSet<Username>> {
        let admins = self
            .store
            .list_group_members(group, PermissionKind::Admin)
            .await?;
        Ok(admins.into_iter().collect())
    }

    pub async fn list_viewers(&self, group: GroupId) -> Result<BTreeSet<Username>> {
        let viewers = self
            .store
            .list_group_members(group, PermissionKind::View)
            .await?;
        Ok(viewers.into_iter().collect())
    }

    pub async fn groups_where_admin(&self, user: &Username) -> Result<Vec<GroupId>> {
        Ok(self
            .store
            .list_user_groups(user, PermissionKind::Admin)
            .await?)
    }

    pub async fn groups_where_viewer(&self, user: &Username) -> Result<Vec<GroupId>> {
        Ok(self
            .store
            .list_user_groups(user, PermissionKind::View)
            .await?)
    }

    /// Snapshot of a group's administrators and viewers.
    pub async fn roster(&self, group: GroupId) -> Result<GroupRoster> {
        let rows = self.store.list_permissions(group).await?;
        Ok(GroupRoster::from_permissions(group, &rows))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Fail with `AccessDenied` unless `user` may perform `op` on `group`.
    ///
    /// A missing group has an empty roster, so it reads as "no permission",
    /// never as `NotFound`.
    pub async fn authorize(
        &self,
        group: GroupId,
        user: &Username,
        op: GroupOperation,
        admin_writes: bool,
    ) -> Result<()> {
        if self.roster(group).await?.allows(user, op, admin_writes) {
            Ok(())
        } else {
            tracing::warn!(%group, user = %user, ?op, "access denied");
            Err(VaultError::AccessDenied)
        }
    }

    /// Grant on behalf of `actor`, who must hold ADMIN on the group.
    pub async fn grant_as(
        &self,
        actor: &Username,
        group: GroupId,
        user: &Username,
        kind: PermissionKind,
    ) -> Result<bool> {
        self.authorize(group, actor, GroupOperation::ManageMembers, true)
            .await?;
        self.grant(group, user, kind).await
    }

    /// Revoke on behalf of `actor`, who must hold ADMIN on the group.
    pub async fn revoke_as(
        &self,
        actor: &Username,
        group: GroupId,
        user: &Username,
        kind: PermissionKind,
    ) -> Result<bool> {
        self.authorize(group, actor, GroupOperation::ManageMembers, true)
            .await?;
        self.revoke(group, user, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpvault_core::{Credential, RoleSet, User};
    use helpvault_store::{CreateGroupOutcome, MemoryStore, SqliteStore};

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    async fn setup(creator_grants: &[PermissionKind]) -> (PermissionMatrix<MemoryStore>, GroupId) {
        let store = Arc::new(MemoryStore::new());
        let CreateGroupOutcome::Created(group) = store
            .create_group("CS101", &name("alice"), creator_grants, 0)
            .await
            .unwrap()
        else {
            panic!("expected creation");
        };
        (PermissionMatrix::new(store), group.id)
    }

    #[tokio::test]
    async fn test_grant_is_idempotent() {
        let (matrix, g) = setup(&[PermissionKind::Admin, PermissionKind::View]).await;

        assert!(matrix.grant(g, &name("carol"), PermissionKind::Admin).await.unwrap());
        assert!(!matrix.grant(g, &name("carol"), PermissionKind::Admin).await.unwrap());

        let roster = matrix.roster(g).await.unwrap();
        assert_eq!(roster.admins.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_does_not_imply_view() {
        let (matrix, g) = setup(&[PermissionKind::Admin, PermissionKind::View]).await;
        matrix.grant(g, &name("bob"), PermissionKind::Admin).await.unwrap();

        assert!(matrix.has(g, &name("bob"), PermissionKind::Admin).await.unwrap());
        assert!(!matrix.has(g, &name("bob"), PermissionKind::View).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (matrix, g) = setup(&[PermissionKind::Admin, PermissionKind::View]).await;

        assert!(matrix.revoke(g, &name("alice"), PermissionKind::View).await.unwrap());
        assert!(!matrix.revoke(g, &name("alice"), PermissionKind::View).await.unwrap());
        assert!(!matrix.revoke(g, &name("nobody"), PermissionKind::Admin).await.unwrap());
    }

    async fn add_account<S: Store>(store: &S, username: &str, role: &str) {
        store
            .insert_user(&User::new(
                name(username),
                Credential::new("pw"),
                RoleSet::single(role).unwrap(),
                0,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_instructor_rule() {
        let (matrix, g) = setup(&[PermissionKind::View]).await;
        add_account(matrix.store.as_ref(), "ivy", Role::INSTRUCTOR).await;
        add_account(matrix.store.as_ref(), "jon", Role::INSTRUCTOR).await;
        assert!(matrix.list_admins(g).await.unwrap().is_empty());

        let first = matrix.add_instructor(g, &name("ivy")).await.unwrap();
        assert_eq!(first, vec![PermissionKind::Admin, PermissionKind::View]);

        let second = matrix.add_instructor(g, &name("jon")).await.unwrap();
        assert_eq!(second, vec![PermissionKind::View]);

        assert_eq!(
            matrix.list_admins(g).await.unwrap(),
            BTreeSet::from([name("ivy")])
        );
        assert_eq!(matrix.groups_where_viewer(&name("jon")).await.unwrap(), vec![g]);
        assert!(matrix.groups_where_admin(&name("jon")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_grant_on_missing_group() {
        let (matrix, _) = setup(&[PermissionKind::Admin]).await;
        let err = matrix
            .grant(GroupId(404), &name("carol"), PermissionKind::View)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_gated_membership_changes() {
        let (matrix, g) = setup(&[PermissionKind::Admin, PermissionKind::View]).await;

        matrix
            .grant_as(&name("alice"), g, &name("carol"), PermissionKind::View)
            .await
            .unwrap();

        let err = matrix
            .grant_as(&name("carol"), g, &name("dave"), PermissionKind::View)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::AccessDenied));

        let err = matrix
            .revoke_as(&name("dave"), GroupId(404), &name("carol"), PermissionKind::View)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::AccessDenied));
    }

    #[tokio::test]
    async fn test_add_instructor_requires_instructor_role() {
        let (matrix, g) = setup(&[PermissionKind::View]).await;
        add_account(matrix.store.as_ref(), "sid", Role::STUDENT).await;

        let err = matrix.add_instructor(g, &name("sid")).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
        let err = matrix.add_instructor(g, &name("ghost")).await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
        assert!(matrix.list_admins(g).await.unwrap().is_empty());
    }

    async fn racing_instructors<S: Store + 'static>(store: Arc<S>) {
        let CreateGroupOutcome::Created(group) = store
            .create_group("Race", &name("alice"), &[PermissionKind::View], 0)
            .await
            .unwrap()
        else {
            panic!("expected creation");
        };
        let matrix = PermissionMatrix::new(store.clone());

        let mut handles = Vec::new();
        for i in 0..8 {
            let username = format!("inst{i}");
            add_account(store.as_ref(), &username, Role::INSTRUCTOR).await;
            let matrix = matrix.clone();
            handles.push(tokio::spawn(async move {
                matrix.add_instructor(group.id, &name(&username)).await.unwrap()
            }));
        }

        let mut elevated = 0;
        for handle in handles {
            if handle.await.unwrap().contains(&PermissionKind::Admin) {
                elevated += 1;
            }
        }
        assert_eq!(elevated, 1);
        assert_eq!(matrix.list_admins(group.id).await.unwrap().len(), 1);
        assert_eq!(matrix.list_viewers(group.id).await.unwrap().len(), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_instructors_memory() {
        for _ in 0..10 {
            racing_instructors(Arc::new(MemoryStore::new())).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_instructors_sqlite() {
        for _ in 0..10 {
            racing_instructors(Arc::new(SqliteStore::open_memory().unwrap())).await;
        }
    }
}
