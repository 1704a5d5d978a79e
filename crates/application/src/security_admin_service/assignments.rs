use super::*;

use sitebeam_core::{AppError, UserId};
use sitebeam_domain::Assignment;

use crate::GrantAssignmentInput;

impl SecurityAdminService {
    /// Grants a role to a user at one scope; re-granting the same triple
    /// refreshes the grant metadata instead of adding a second row.
    pub async fn grant_assignment(
        &self,
        actor: &UserIdentity,
        input: GrantAssignmentInput,
    ) -> AppResult<Assignment> {
        self.require_assignment_manage(actor).await?;

        let GrantAssignmentInput {
            user_id,
            role_id,
            scope,
            expires_at,
        } = input;

        if self.role_repository.find_role(&role_id).await?.is_none() {
            return Err(AccessError::UnknownRole(role_id.to_string()).into());
        }

        let now = self.clock.now();
        if let Some(expires_at) = expires_at {
            if expires_at <= now {
                return Err(AccessError::InvalidExpiry(format!(
                    "expiry '{expires_at}' is not in the future"
                ))
                .into());
            }
        }

        let assignment = Assignment::new(
            user_id,
            role_id,
            scope,
            actor.user_id(),
            now,
            expires_at,
        );
        let stored = self.assignment_repository.upsert(assignment).await?;
        self.decision_cache.invalidate_user(user_id).await?;

        self.append_audit_event(
            actor,
            AuditAction::AssignmentGranted,
            "rbac_assignment",
            assignment_key(&stored),
            Some(format!(
                "granted role '{}' to user '{}' at scope '{}'",
                stored.role_id(),
                stored.user_id(),
                stored.scope()
            )),
        )
        .await?;

        Ok(stored)
    }

    /// Soft-revokes one assignment; the row stays for administrative display.
    pub async fn revoke_assignment(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: &RoleId,
        scope: &Scope,
    ) -> AppResult<()> {
        self.require_assignment_manage(actor).await?;

        let revoked = self
            .assignment_repository
            .revoke(user_id, role_id, scope)
            .await?;
        if !revoked {
            return Err(AppError::NotFound(format!(
                "assignment '{user_id}:{role_id}:{scope}' was not found"
            )));
        }

        self.decision_cache.invalidate_user(user_id).await?;

        self.append_audit_event(
            actor,
            AuditAction::AssignmentRevoked,
            "rbac_assignment",
            format!("{user_id}:{role_id}:{scope}"),
            Some(format!(
                "revoked role '{role_id}' from user '{user_id}' at scope '{scope}'"
            )),
        )
        .await
    }

    /// Returns every assignment for one user, active and revoked.
    pub async fn list_assignments_for_user(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Vec<Assignment>> {
        self.require_assignment_manage(actor).await?;

        let assignments = self.assignment_repository.list_for_user(user_id).await?;
        Ok(assignments)
    }
}

fn assignment_key(assignment: &Assignment) -> String {
    format!(
        "{}:{}:{}",
        assignment.user_id(),
        assignment.role_id(),
        assignment.scope()
    )
}
