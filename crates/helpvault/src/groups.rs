//! Group Lifecycle Manager: creation with bootstrap grants and cascading
//! deletion.

use std::sync::Arc;

use helpvault_core::{now_millis, Group, GroupId, Username};
use helpvault_perms::{bootstrap_grants, GroupOperation};
use helpvault_store::{CascadeReport, CreateGroupOutcome, Store};

use crate::error::{Result, VaultError};
use crate::matrix::PermissionMatrix;

pub struct GroupManager<S> {
    store: Arc<S>,
    matrix: PermissionMatrix<S>,
}

impl<S> Clone for GroupManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            matrix: self.matrix.clone(),
        }
    }
}

impl<S: Store> GroupManager<S> {
    pub fn new(store: Arc<S>, matrix: PermissionMatrix<S>) -> Self {
        Self { store, matrix }
    }

    /// Create a group. The creator receives ADMIN and VIEW in the same unit.
    pub async fn create_group(&self, name: &str, creator: &Username) -> Result<Group> {
        Group::validate_name(name)?;

        let outcome = self
            .store
            .create_group(name, creator, &bootstrap_grants(), now_millis())
            .await?;

        match outcome {
            CreateGroupOutcome::Created(group) => {
                tracing::info!(group = %group.id, name, creator = %creator, "group created");
                Ok(group)
            }
            CreateGroupOutcome::NameTaken => {
                Err(VaultError::DuplicateIdentity(format!("group {name:?}")))
            }
        }
    }

    pub async fn get_group(&self, id: GroupId) -> Result<Group> {
        self.store
            .get_group(id)
            .await?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    /// Look a group up by display name.
    pub async fn find_group(&self, name: &str) -> Result<Group> {
        self.store
            .get_group_by_name(name)
            .await?
            .ok_or_else(|| VaultError::NotFound(format!("group {name:?}")))
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.store.list_groups().await?)
    }

    /// Delete a group: permissions, then articles, then the group row,
    /// as one unit. Deleting an absent group fails with `NotFound`.
    pub async fn delete_group(&self, id: GroupId) -> Result<CascadeReport> {
        let report = self
            .store
            .delete_group_cascade(id)
            .await?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        tracing::info!(
            group = %id,
            permissions = report.permissions,
            articles = report.articles,
            "group deleted"
        );
        Ok(report)
    }

    /// Delete a group on behalf of `actor`, who must hold ADMIN on it.
    pub async fn delete_group_as(&self, actor: &Username, id: GroupId) -> Result<CascadeReport> {
        self.matrix
            .authorize(id, actor, GroupOperation::DeleteGroup, true)
            .await?;
        self.delete_group(id).await
    }
}
