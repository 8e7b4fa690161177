//! Special-access groups and the permission kinds of the group matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{GroupId, Username};

/// A right held by a user on a group.
///
/// The two kinds are independent: ADMIN does not imply VIEW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    /// Manage the group: membership, article writes, deletion.
    Admin,
    /// Read (decrypt) the group's articles.
    View,
}

impl PermissionKind {
    /// Both kinds, in storage order.
    pub const ALL: [PermissionKind; 2] = [PermissionKind::Admin, PermissionKind::View];

    /// Storage label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Admin => "ADMIN",
            PermissionKind::View => "VIEW",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ADMIN" => Ok(PermissionKind::Admin),
            "VIEW" => Ok(PermissionKind::View),
            other => Err(CoreError::UnknownPermissionKind(other.to_string())),
        }
    }
}

/// One row of the permission matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupPermission {
    pub group: GroupId,
    pub user: Username,
    pub kind: PermissionKind,
}

/// A special-access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Unique display name.
    pub name: String,
    pub creator: Username,
    pub created_at: i64,
}

impl Group {
    /// Validate a display name before creation.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidGroupName("group name is empty".into()));
        }
        if name.trim() != name {
            return Err(CoreError::InvalidGroupName(format!(
                "{name:?} has surrounding whitespace"
            )));
        }
        Ok(())
    }
}
