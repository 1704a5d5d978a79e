use std::sync::Arc;

use sitebeam_application::{
    AssignmentRepository, Clock, PermissionRegistry, RoleRepository, SUPER_ADMIN_ROLE_ID,
    builtin_roles,
};
use sitebeam_core::{AppResult, UserId};
use sitebeam_domain::{Assignment, Role, RoleId, Scope};
use tracing::info;

/// Upserts the built-in system roles.
///
/// Existing rows keep their activation state; their permission sets are
/// refreshed so catalog additions reach already-provisioned databases.
pub async fn seed_system_roles(
    role_repository: &Arc<dyn RoleRepository>,
    registry: &PermissionRegistry,
) -> AppResult<()> {
    for role in builtin_roles(registry)? {
        match role_repository.find_role(role.id()).await? {
            None => {
                role_repository.insert_role(&role).await?;
                info!(role_id = %role.id(), "seeded system role");
            }
            Some(existing) => {
                let refreshed = Role::from_parts(
                    existing.id().clone(),
                    existing.display_name().to_owned(),
                    existing.localized_name().map(ToOwned::to_owned),
                    existing.privilege_level(),
                    true,
                    existing.is_active(),
                    role.permissions().clone(),
                );
                role_repository.save_role(&refreshed).await?;
            }
        }
    }

    Ok(())
}

/// Grants the bootstrap administrator a global `super_admin` assignment so
/// the administrative surface is reachable on a fresh database.
pub async fn seed_bootstrap_admin(
    assignment_repository: &Arc<dyn AssignmentRepository>,
    clock: &Arc<dyn Clock>,
    user_id: UserId,
) -> AppResult<()> {
    let super_admin = RoleId::parse(SUPER_ADMIN_ROLE_ID)?;
    let existing = assignment_repository.list_for_user(user_id).await?;
    if existing.iter().any(|assignment| {
        assignment.role_id() == &super_admin
            && assignment.scope().is_global()
            && assignment.is_active()
    }) {
        return Ok(());
    }

    assignment_repository
        .upsert(Assignment::new(
            user_id,
            super_admin,
            Scope::Global,
            user_id,
            clock.now(),
            None,
        ))
        .await?;
    info!(%user_id, "granted bootstrap super_admin assignment");

    Ok(())
}
