//! Permission rules for group operations.
//!
//! Every group operation is gated on exactly one permission kind. The
//! rules here are pure; the store applies the resulting grants atomically.

use helpvault_core::PermissionKind;

/// An operation performed on a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupOperation {
    /// Decrypt and read an article, or list article ids.
    ReadArticles,
    /// Create or replace an encrypted article.
    WriteArticles,
    /// Grant or revoke permissions on the group.
    ManageMembers,
    /// Delete the group and everything it owns.
    DeleteGroup,
}

impl GroupOperation {
    /// The permission kind required for this operation.
    ///
    /// With `admin_writes` off, article writes only need VIEW.
    pub const fn required(&self, admin_writes: bool) -> PermissionKind {
        match self {
            GroupOperation::ReadArticles => PermissionKind::View,
            GroupOperation::WriteArticles if !admin_writes => PermissionKind::View,
            GroupOperation::WriteArticles
            | GroupOperation::ManageMembers
            | GroupOperation::DeleteGroup => PermissionKind::Admin,
        }
    }
}

/// Grants given to the creator of a new group.
pub const fn bootstrap_grants() -> [PermissionKind; 2] {
    [PermissionKind::Admin, PermissionKind::View]
}

/// Grants given to an instructor being added to a group.
///
/// The first instructor of a group with no administrator becomes its
/// administrator as well; later instructors only receive VIEW.
pub fn instructor_grants(group_has_admin: bool) -> &'static [PermissionKind] {
    if group_has_admin {
        &[PermissionKind::View]
    } else {
        &[PermissionKind::Admin, PermissionKind::View]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_requirements() {
        assert_eq!(
            GroupOperation::ReadArticles.required(true),
            PermissionKind::View
        );
        assert_eq!(
            GroupOperation::WriteArticles.required(true),
            PermissionKind::Admin
        );
        assert_eq!(
            GroupOperation::WriteArticles.required(false),
            PermissionKind::View
        );
        assert_eq!(
            GroupOperation::DeleteGroup.required(false),
            PermissionKind::Admin
        );
        assert_eq!(
            GroupOperation::ManageMembers.required(false),
            PermissionKind::Admin
        );
    }

    #[test]
    fn test_first_instructor_is_admin() {
        assert_eq!(
            instructor_grants(false),
            &[PermissionKind::Admin, PermissionKind::View]
        );
        assert_eq!(instructor_grants(true), &[PermissionKind::View]);
    }

    #[test]
    fn test_creator_gets_both_kinds() {
        let grants = bootstrap_grants();
        assert!(grants.contains(&PermissionKind::Admin));
        assert!(grants.contains(&PermissionKind::View));
    }
}
