//! Proptest generators for property-based testing.

use proptest::prelude::*;

use helpvault_core::{
    GroupId, GroupPermission, InvitationCode, PermissionKind, Role, RoleSet, Username,
};
use helpvault_perms::{ContentKey, IvStrategy};

/// Generate a valid username.
pub fn username() -> impl Strategy<Value = Username> {
    "[a-z][a-z0-9_.]{0,23}".prop_map(|s| Username::new(s).expect("pattern is a valid username"))
}

/// Generate a role label: one of the well-known roles or a custom one.
pub fn role_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(Role::ADMIN.to_string()),
        Just(Role::STUDENT.to_string()),
        Just(Role::INSTRUCTOR.to_string()),
        "[A-Z][a-z]{2,11}".prop_map(String::from),
    ]
}

/// Generate a non-empty role set.
pub fn role_set() -> impl Strategy<Value = RoleSet> {
    prop::collection::vec(role_label(), 1..=4)
        .prop_map(|labels| RoleSet::from_labels(labels).expect("labels are valid"))
}

/// Generate a PermissionKind.
pub fn permission_kind() -> impl Strategy<Value = PermissionKind> {
    prop_oneof![Just(PermissionKind::Admin), Just(PermissionKind::View)]
}

/// Generate an invitation code.
pub fn invitation_code() -> impl Strategy<Value = InvitationCode> {
    "[A-Za-z0-9]{1,20}"
        .prop_map(|s| InvitationCode::parse(s).expect("pattern is a valid code"))
}

/// Generate a credential meeting the default password policy.
pub fn strong_credential() -> impl Strategy<Value = String> {
    ("[A-Z]{1,4}", "[a-z]{4,12}", "[!@#$%^&*]{1,2}", "[0-9]{0,3}")
        .prop_map(|(upper, lower, special, digits)| format!("{upper}{lower}{special}{digits}"))
}

/// Generate plaintext bytes of specified max length.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a content key.
pub fn content_key() -> impl Strategy<Value = ContentKey> {
    any::<[u8; 32]>().prop_map(ContentKey::from_bytes)
}

/// Generate an IV strategy.
pub fn iv_strategy() -> impl Strategy<Value = IvStrategy> {
    prop_oneof![Just(IvStrategy::Random), Just(IvStrategy::DerivedFromPlaintext)]
}

/// Generate permission rows for a handful of groups and users.
pub fn permission_rows(max_rows: usize) -> impl Strategy<Value = Vec<GroupPermission>> {
    prop::collection::vec(
        (1i64..=3, username(), permission_kind()).prop_map(|(group, user, kind)| {
            GroupPermission {
                group: GroupId(group),
                user,
                kind,
            }
        }),
        0..=max_rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpvault_core::PasswordPolicy;
    use helpvault_perms::{GroupOperation, GroupRoster, SealedContent};

    proptest! {
        #[test]
        fn test_seal_open_round_trip(
            key in content_key(),
            body in plaintext(512),
            strategy in iv_strategy(),
        ) {
            let sealed = SealedContent::seal(&key, &body, strategy).unwrap();
            let decoded = SealedContent::decode(&sealed.encode()).unwrap();
            prop_assert_eq!(decoded.open(&key).unwrap(), body);
        }

        #[test]
        fn test_wrong_key_never_opens(
            k1 in content_key(),
            k2 in content_key(),
            body in plaintext(64),
        ) {
            prop_assume!(k1.fingerprint() != k2.fingerprint());
            let sealed = SealedContent::seal(&k1, &body, IvStrategy::Random).unwrap();
            prop_assert!(sealed.open(&k2).is_err());
        }

        #[test]
        fn test_generated_credentials_pass_policy(cred in strong_credential()) {
            prop_assert!(PasswordPolicy::default().check(&cred).is_ok());
        }

        #[test]
        fn test_role_set_column_round_trip(roles in role_set()) {
            let column = roles.to_column();
            prop_assert_eq!(RoleSet::from_column(&column).unwrap(), roles);
        }

        #[test]
        fn test_roster_replay_is_idempotent(rows in permission_rows(24)) {
            let once = GroupRoster::from_permissions(GroupId(1), &rows);
            let doubled: Vec<_> = rows.iter().chain(rows.iter()).cloned().collect();
            let twice = GroupRoster::from_permissions(GroupId(1), &doubled);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_view_rule_matches_rows(rows in permission_rows(24), who in username()) {
            let roster = GroupRoster::from_permissions(GroupId(2), &rows);
            let expected = rows.iter().any(|r| {
                r.group == GroupId(2) && r.user == who && r.kind == PermissionKind::View
            });
            prop_assert_eq!(roster.allows(&who, GroupOperation::ReadArticles, true), expected);
        }
    }
}
