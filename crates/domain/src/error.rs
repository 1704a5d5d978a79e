use sitebeam_core::AppError;
use thiserror::Error;

/// Result type for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised by the access-control core.
///
/// Administrative errors surface to the caller for correction. Inside the
/// resolution path only two conditions are errors at all: an unregistered
/// permission (a caller bug) and an unreachable store — the latter is
/// converted to Deny at the policy boundary, never to Allow.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Permission id is not present in the registry.
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    /// Role id does not resolve to a role.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    /// Role id is already taken.
    #[error("role '{0}' already exists")]
    RoleAlreadyExists(String),

    /// Permission id registered twice with conflicting definitions.
    #[error("permission '{0}' is already registered with a different definition")]
    DuplicateIdentifier(String),

    /// Mutation rejected because the role is system-managed.
    #[error("role '{0}' is protected: {1}")]
    ProtectedRole(String, String),

    /// Requested expiry is not in the future.
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),

    /// Underlying store unreachable or failing.
    #[error("data access failure: {0}")]
    DataAccessFailure(String),
}

impl From<AccessError> for AppError {
    fn from(value: AccessError) -> Self {
        let message = value.to_string();
        match value {
            AccessError::UnknownPermission(_) | AccessError::InvalidExpiry(_) => {
                Self::Validation(message)
            }
            AccessError::UnknownRole(_) => Self::NotFound(message),
            AccessError::RoleAlreadyExists(_) | AccessError::DuplicateIdentifier(_) => {
                Self::Conflict(message)
            }
            AccessError::ProtectedRole(_, _) => Self::Forbidden(message),
            AccessError::DataAccessFailure(_) => Self::Internal(message),
        }
    }
}
