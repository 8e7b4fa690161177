//! Error types for Help Vault core validation.

use thiserror::Error;

use crate::policy::PolicyViolation;

/// Validation errors raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("invalid role label: {0}")]
    InvalidRole(String),

    #[error("role set would become empty")]
    EmptyRoleSet,

    #[error("invalid invitation code: {0}")]
    InvalidInvitationCode(String),

    #[error("invalid group name: {0}")]
    InvalidGroupName(String),

    #[error("unknown permission kind: {0}")]
    UnknownPermissionKind(String),

    #[error("invalid help article: {0}")]
    InvalidArticle(String),

    #[error("credential rejected by password policy: {}", describe(.0))]
    WeakCredential(Vec<PolicyViolation>),
}

fn describe(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for core validation.
pub type Result<T> = std::result::Result<T, CoreError>;
