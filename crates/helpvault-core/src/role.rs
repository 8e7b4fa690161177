//! Role labels and role sets.
//!
//! Roles are free-form labels. The source stored them as one delimited
//! string and removed roles by substring edit, which corrupted labels that
//! contain one another ("Admin" inside "SuperAdmin"). Here a user's roles
//! are a true ordered set; the delimited form exists only at the storage
//! boundary.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Delimiter used when a role set is flattened into a single column.
pub const ROLE_DELIMITER: char = ',';

const MAX_ROLE_LEN: usize = 64;

/// Well-known role labels used by the presentation layer.
pub struct Role;

impl Role {
    pub const ADMIN: &'static str = "Admin";
    pub const STUDENT: &'static str = "Student";
    pub const INSTRUCTOR: &'static str = "Instructor";
}

/// A set of role labels.
///
/// Labels are compared exactly (case-sensitive). An account's set is
/// non-empty; [`RoleSet::remove`] refuses to remove the last label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Create a set holding a single validated label.
    pub fn single(role: &str) -> Result<Self> {
        let mut set = Self::default();
        set.insert(role)?;
        Ok(set)
    }

    /// Build a set from several labels.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for label in labels {
            set.insert(label.as_ref())?;
        }
        Ok(set)
    }

    /// Validate a role label.
    pub fn validate_label(role: &str) -> Result<()> {
        if role.trim().is_empty() {
            return Err(CoreError::InvalidRole("role label is empty".into()));
        }
        if role.trim() != role {
            return Err(CoreError::InvalidRole(format!(
                "{role:?} has surrounding whitespace"
            )));
        }
        if role.contains(ROLE_DELIMITER) {
            return Err(CoreError::InvalidRole(format!(
                "{role:?} contains {ROLE_DELIMITER:?}"
            )));
        }
        if role.len() > MAX_ROLE_LEN {
            return Err(CoreError::InvalidRole(format!(
                "longer than {MAX_ROLE_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// Add a label. Returns `false` if it was already present.
    pub fn insert(&mut self, role: &str) -> Result<bool> {
        Self::validate_label(role)?;
        Ok(self.0.insert(role.to_string()))
    }

    /// Remove a label by exact match.
    ///
    /// Returns `false` if the label was not present. Removing the last label
    /// fails with [`CoreError::EmptyRoleSet`] and leaves the set unchanged.
    pub fn remove(&mut self, role: &str) -> Result<bool> {
        if !self.0.contains(role) {
            return Ok(false);
        }
        if self.0.len() == 1 {
            return Err(CoreError::EmptyRoleSet);
        }
        Ok(self.0.remove(role))
    }

    /// Check membership by exact match.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Flatten to the storage column form (`"Admin,Student"`).
    pub fn to_column(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }

    /// Parse the storage column form. Empty segments are skipped.
    pub fn from_column(column: &str) -> Result<Self> {
        let labels = column
            .split(ROLE_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let set = Self::from_labels(labels)?;
        if set.is_empty() {
            return Err(CoreError::EmptyRoleSet);
        }
        Ok(set)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_column())
    }
}
