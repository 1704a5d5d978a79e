use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitebeam_application::AccessDecision;
use sitebeam_domain::{Assignment, Role};
use uuid::Uuid;

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming authorization check for one principal.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub user_id: Uuid,
    pub permission: String,
    pub business_unit: String,
}

/// Authorization decision payload; provenance fields are present on allow,
/// the reason on deny.
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub decision: String,
    pub role_id: Option<String>,
    pub scope: Option<String>,
    pub granted_by: Option<Uuid>,
    pub granted_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl AuthorizeResponse {
    /// Builds a denial payload with the given reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            decision: "deny".to_owned(),
            role_id: None,
            scope: None,
            granted_by: None,
            granted_at: None,
            reason: Some(reason.into()),
        }
    }
}

impl From<AccessDecision> for AuthorizeResponse {
    fn from(value: AccessDecision) -> Self {
        match value {
            AccessDecision::Allow { provenance } => Self {
                decision: "allow".to_owned(),
                role_id: Some(provenance.role_id.to_string()),
                scope: Some(provenance.scope.to_string()),
                granted_by: Some(provenance.granted_by.as_uuid()),
                granted_at: Some(provenance.granted_at),
                reason: None,
            },
            AccessDecision::Deny { reason } => Self::denied(reason),
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub role_id: String,
    pub display_name: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    #[serde(default)]
    pub privilege_level: i16,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload naming one role permission.
#[derive(Debug, Deserialize)]
pub struct RolePermissionRequest {
    pub permission: String,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub display_name: String,
    pub localized_name: Option<String>,
    pub privilege_level: i16,
    pub is_system: bool,
    pub is_active: bool,
    pub permissions: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id().to_string(),
            display_name: value.display_name().to_owned(),
            localized_name: value.localized_name().map(ToOwned::to_owned),
            privilege_level: value.privilege_level(),
            is_system: value.is_system(),
            is_active: value.is_active(),
            permissions: value
                .permissions()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Incoming payload for granting a role to a user.
#[derive(Debug, Deserialize)]
pub struct GrantAssignmentRequest {
    pub user_id: Uuid,
    pub role_id: String,
    pub business_unit: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming payload for revoking a user-role assignment.
#[derive(Debug, Deserialize)]
pub struct RevokeAssignmentRequest {
    pub user_id: Uuid,
    pub role_id: String,
    pub business_unit: String,
}

/// Query parameters for assignment listing.
#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    pub user_id: Uuid,
}

/// API representation of a user-role assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub user_id: Uuid,
    pub role_id: String,
    pub scope: String,
    pub is_active: bool,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(value: Assignment) -> Self {
        Self {
            user_id: value.user_id().as_uuid(),
            role_id: value.role_id().to_string(),
            scope: value.scope().to_string(),
            is_active: value.is_active(),
            granted_by: value.granted_by().as_uuid(),
            granted_at: value.granted_at(),
            expires_at: value.expires_at(),
        }
    }
}
