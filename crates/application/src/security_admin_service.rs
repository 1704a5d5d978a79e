use std::sync::Arc;

use sitebeam_core::{AppResult, UserIdentity};
use sitebeam_domain::{AccessError, AuditAction, PermissionId, Role, RoleId, Scope};

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, AuthorizationService, Clock, DecisionCache,
    PermissionRegistry, RoleRepository,
};

mod assignments;
mod roles;

#[cfg(test)]
mod tests;

/// Permission required for role-catalog administration.
pub const MANAGE_ROLES_PERMISSION: &str = "security:manage_roles";

/// Permission required for user-assignment administration.
pub const MANAGE_ASSIGNMENTS_PERMISSION: &str = "security:manage_assignments";

/// Permission required to deactivate system roles.
pub const MANAGE_SYSTEM_ROLES_PERMISSION: &str = "security:manage_system_roles";

/// Application service for role-catalog and assignment administration.
///
/// Every operation checks the acting administrator through the resolution
/// engine at the global scope, mutates, invalidates the decision cache before
/// returning, and appends an audit event.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    registry: Arc<PermissionRegistry>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    decision_cache: Arc<dyn DecisionCache>,
    audit_repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl SecurityAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        registry: Arc<PermissionRegistry>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        decision_cache: Arc<dyn DecisionCache>,
        audit_repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorization_service,
            registry,
            role_repository,
            assignment_repository,
            decision_cache,
            audit_repository,
            clock,
        }
    }

    async fn require_role_manage(&self, actor: &UserIdentity) -> AppResult<()> {
        let permission = PermissionId::parse(MANAGE_ROLES_PERMISSION)?;
        self.authorization_service
            .require(actor.user_id(), &permission, &Scope::Global)
            .await
    }

    async fn require_assignment_manage(&self, actor: &UserIdentity) -> AppResult<()> {
        let permission = PermissionId::parse(MANAGE_ASSIGNMENTS_PERMISSION)?;
        self.authorization_service
            .require(actor.user_id(), &permission, &Scope::Global)
            .await
    }

    async fn may_manage_system_roles(&self, actor: &UserIdentity) -> AppResult<bool> {
        let permission = PermissionId::parse(MANAGE_SYSTEM_ROLES_PERMISSION)?;
        let decision = self
            .authorization_service
            .authorize(actor.user_id(), &permission, &Scope::Global)
            .await?;

        Ok(decision.is_allowed())
    }

    async fn load_role(&self, role_id: &RoleId) -> AppResult<Role> {
        let role = self.role_repository.find_role(role_id).await?;
        role.ok_or_else(|| AccessError::UnknownRole(role_id.to_string()).into())
    }

    async fn append_audit_event(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                actor_id: actor.user_id(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail,
            })
            .await?;

        Ok(())
    }
}
