use sitebeam_core::AppResult;
use sitebeam_domain::{PermissionId, Role, RoleId};

use crate::PermissionRegistry;

/// Role id of the highest-privilege built-in role.
pub const SUPER_ADMIN_ROLE_ID: &str = "super_admin";

/// Returns the built-in system roles, seeded idempotently at startup.
///
/// `super_admin` holds the full registered catalog, including
/// `security:manage_system_roles`; every other role holds an explicit
/// subset. Every referenced permission is validated against the registry so
/// catalog drift fails at boot instead of at resolution time.
pub fn builtin_roles(registry: &PermissionRegistry) -> AppResult<Vec<Role>> {
    let mut super_admin = system_role(SUPER_ADMIN_ROLE_ID, "Super Administrator", 100)?;
    for definition in registry.iter() {
        super_admin.grant(definition.id().clone());
    }

    Ok(vec![
        super_admin,
        system_role_with(
            registry,
            "security_officer",
            "Security Officer",
            90,
            &[
                "security:manage_roles",
                "security:manage_assignments",
                "security:read_audit",
            ],
        )?,
        system_role_with(
            registry,
            "finance_officer",
            "Finance Officer",
            70,
            &[
                "finance:create",
                "finance:read",
                "finance:update",
                "finance:delete",
                "finance:approve_payment",
                "contracts:read",
                "reports:read",
                "reports:export",
            ],
        )?,
        system_role_with(
            registry,
            "compliance_officer",
            "Compliance Officer",
            70,
            &[
                "regulations:create",
                "regulations:read",
                "regulations:update",
                "regulations:delete",
                "security:read_audit",
                "reports:read",
                "reports:export",
            ],
        )?,
        system_role_with(
            registry,
            "project_manager",
            "Project Manager",
            60,
            &[
                "projects:create",
                "projects:read",
                "projects:update",
                "contracts:read",
                "procurement:read",
                "notifications:read",
                "reports:read",
            ],
        )?,
        system_role_with(
            registry,
            "contract_manager",
            "Contract Manager",
            60,
            &[
                "contracts:create",
                "contracts:read",
                "contracts:update",
                "contracts:approve",
                "projects:read",
                "reports:read",
            ],
        )?,
        system_role_with(
            registry,
            "procurement_officer",
            "Procurement Officer",
            60,
            &[
                "procurement:create",
                "procurement:read",
                "procurement:update",
                "procurement:approve_order",
                "projects:read",
                "contracts:read",
            ],
        )?,
        system_role_with(
            registry,
            "viewer",
            "Viewer",
            10,
            &[
                "projects:read",
                "contracts:read",
                "finance:read",
                "procurement:read",
                "regulations:read",
                "notifications:read",
                "reports:read",
            ],
        )?,
    ])
}

fn system_role(id: &str, display_name: &str, privilege_level: i16) -> AppResult<Role> {
    Role::new(RoleId::parse(id)?, display_name, privilege_level, true)
}

fn system_role_with(
    registry: &PermissionRegistry,
    id: &str,
    display_name: &str,
    privilege_level: i16,
    permissions: &[&str],
) -> AppResult<Role> {
    let mut role = system_role(id, display_name, privilege_level)?;
    for value in permissions {
        let permission = PermissionId::parse(value)?;
        registry.lookup(&permission)?;
        role.grant(permission);
    }

    Ok(role)
}
