//! Materialized permission state of one group.
//!
//! A [`GroupRoster`] is built from the permission rows of a group and
//! answers membership questions without further storage reads.

use std::collections::BTreeSet;

use helpvault_core::{GroupId, GroupPermission, PermissionKind, Username};

use crate::grant::GroupOperation;

/// Administrators and viewers of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRoster {
    pub group: GroupId,
    pub admins: BTreeSet<Username>,
    pub viewers: BTreeSet<Username>,
}

impl GroupRoster {
    /// Create an empty roster.
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            admins: BTreeSet::new(),
            viewers: BTreeSet::new(),
        }
    }

    /// Build from permission rows. Rows for other groups are ignored.
    pub fn from_permissions<'a, I>(group: GroupId, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a GroupPermission>,
    {
        let mut roster = Self::new(group);
        for row in rows.into_iter().filter(|r| r.group == group) {
            roster.apply(row.user.clone(), row.kind);
        }
        roster
    }

    /// Record a grant.
    pub fn apply(&mut self, user: Username, kind: PermissionKind) {
        match kind {
            PermissionKind::Admin => self.admins.insert(user),
            PermissionKind::View => self.viewers.insert(user),
        };
    }

    /// Whether `user` holds `kind`.
    pub fn holds(&self, user: &Username, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::Admin => self.admins.contains(user),
            PermissionKind::View => self.viewers.contains(user),
        }
    }

    /// Whether `user` may perform `op`.
    pub fn allows(&self, user: &Username, op: GroupOperation, admin_writes: bool) -> bool {
        self.holds(user, op.required(admin_writes))
    }

    /// Everyone holding at least one kind.
    pub fn members(&self) -> BTreeSet<&Username> {
        self.admins.iter().chain(self.viewers.iter()).collect()
    }
}
