use super::*;

use crate::CreateRoleInput;

impl SecurityAdminService {
    /// Returns every role in the catalog for administrative display.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        self.require_role_manage(actor).await?;
        let mut roles = self.role_repository.list_roles().await?;
        roles.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(roles)
    }

    /// Creates a role with its initial permission set.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        self.require_role_manage(actor).await?;

        for permission in &input.permissions {
            self.registry.lookup(permission)?;
        }

        if self
            .role_repository
            .find_role(&input.role_id)
            .await?
            .is_some()
        {
            return Err(AccessError::RoleAlreadyExists(input.role_id.to_string()).into());
        }

        let mut role = Role::new(
            input.role_id,
            input.display_name,
            input.privilege_level,
            input.is_system,
        )?;
        role.set_localized_name(input.localized_name);
        for permission in input.permissions {
            role.grant(permission);
        }

        self.role_repository.insert_role(&role).await?;
        self.decision_cache.invalidate_all().await?;

        self.append_audit_event(
            actor,
            AuditAction::RoleCreated,
            "rbac_role",
            role.id().to_string(),
            Some(format!("created role '{}'", role.id())),
        )
        .await?;

        Ok(role)
    }

    /// Adds a permission to a role; granting twice is a no-op.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        role_id: &RoleId,
        permission: &PermissionId,
    ) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        self.registry.lookup(permission)?;

        let mut role = self.load_role(role_id).await?;
        if !role.grant(permission.clone()) {
            return Ok(());
        }

        self.role_repository.save_role(&role).await?;
        self.decision_cache.invalidate_all().await?;

        self.append_audit_event(
            actor,
            AuditAction::RolePermissionGranted,
            "rbac_role",
            role_id.to_string(),
            Some(format!("granted '{permission}' to role '{role_id}'")),
        )
        .await
    }

    /// Removes a permission from a role; revoking an absent grant is a no-op.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        role_id: &RoleId,
        permission: &PermissionId,
    ) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        self.registry.lookup(permission)?;

        let mut role = self.load_role(role_id).await?;
        if !role.revoke(permission) {
            return Ok(());
        }

        self.role_repository.save_role(&role).await?;
        self.decision_cache.invalidate_all().await?;

        self.append_audit_event(
            actor,
            AuditAction::RolePermissionRevoked,
            "rbac_role",
            role_id.to_string(),
            Some(format!("revoked '{permission}' from role '{role_id}'")),
        )
        .await
    }

    /// Deactivates a role so it contributes no permissions.
    ///
    /// System roles may be deactivated only by holders of
    /// `security:manage_system_roles`.
    pub async fn deactivate_role(&self, actor: &UserIdentity, role_id: &RoleId) -> AppResult<()> {
        self.require_role_manage(actor).await?;

        let mut role = self.load_role(role_id).await?;
        if role.is_system() && !self.may_manage_system_roles(actor).await? {
            return Err(AccessError::ProtectedRole(
                role_id.to_string(),
                format!("system roles require '{MANAGE_SYSTEM_ROLES_PERMISSION}' to deactivate"),
            )
            .into());
        }

        if !role.is_active() {
            return Ok(());
        }

        role.deactivate();
        self.role_repository.save_role(&role).await?;
        self.decision_cache.invalidate_all().await?;

        self.append_audit_event(
            actor,
            AuditAction::RoleDeactivated,
            "rbac_role",
            role_id.to_string(),
            Some(format!("deactivated role '{role_id}'")),
        )
        .await
    }

    /// Deletes a custom role and every assignment referencing it.
    ///
    /// System roles are never deleted, so their ids can never be reused.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: &RoleId) -> AppResult<()> {
        self.require_role_manage(actor).await?;

        let role = self.load_role(role_id).await?;
        if role.is_system() {
            return Err(AccessError::ProtectedRole(
                role_id.to_string(),
                "system roles cannot be deleted".to_owned(),
            )
            .into());
        }

        let removed = self.assignment_repository.delete_for_role(role_id).await?;
        self.role_repository.delete_role(role_id).await?;
        self.decision_cache.invalidate_all().await?;

        self.append_audit_event(
            actor,
            AuditAction::RoleDeleted,
            "rbac_role",
            role_id.to_string(),
            Some(format!(
                "deleted role '{role_id}' and {removed} assignment(s)"
            )),
        )
        .await
    }
}
