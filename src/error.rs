use crate::types::RoleId;
use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
///
/// Every variant is a configuration error: a malformed grant declaration or
/// a malformed resolver query. Access denial is never an error; it is
/// reported as [`Permission::granted`](crate::Permission::granted) being
/// false.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Unrecognized action keyword.
    #[error("action is no valid option: {0}")]
    InvalidAction(String),
    /// Unrecognized scope keyword.
    #[error("scope is no valid option: {0}")]
    InvalidScope(String),
    /// Malformed field allow-list declaration.
    #[error("invalid field rule: {0}")]
    InvalidFieldRule(String),
    /// Query names a role the grant table does not declare.
    #[error("unknown role: {0}")]
    UnknownRole(RoleId),
    /// Role extended a second time toward a different parent.
    #[error("role {role} already extends {existing}, cannot extend {requested}")]
    ConflictingParent {
        role: RoleId,
        existing: RoleId,
        requested: RoleId,
    },
    /// Role inheritance cycle detected.
    #[error("role cycle detected at role {role}")]
    RoleCycleDetected { role: RoleId },
}
