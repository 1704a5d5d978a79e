use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sitebeam_core::UserId;
use sitebeam_domain::{AccessResult, AuditAction, PermissionId, RoleId, Scope};

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Human-readable role name.
    pub display_name: String,
    /// Optional localized display name.
    pub localized_name: Option<String>,
    /// Display-ordering privilege level.
    pub privilege_level: i16,
    /// Marks the role as system-managed.
    pub is_system: bool,
    /// Initial permission grants; every id must be registered.
    pub permissions: Vec<PermissionId>,
}

/// Input payload for granting a role to a user at one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantAssignmentInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role being granted.
    pub role_id: RoleId,
    /// Scope the grant applies to.
    pub scope: Scope,
    /// Optional expiry; must lie in the future when present.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Immutable audit event payload emitted by administrative use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Administrator that performed the action.
    pub actor_id: UserId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AccessResult<()>;
}
