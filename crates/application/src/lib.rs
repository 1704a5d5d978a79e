//! Application services and ports for the Sitebeam access-control core.

#![forbid(unsafe_code)]

mod authorization_service;
mod clock;
mod permission_registry;
mod security_admin_ports;
mod security_admin_service;
mod system_roles;

pub use authorization_service::{
    AccessDecision, AccessRequirement, AssignmentRepository, AuthorizationService, DecisionCache,
    GrantProvenance, RoleRepository, TargetSource,
};
pub use clock::{Clock, SystemClock};
pub use permission_registry::PermissionRegistry;
pub use security_admin_ports::{AuditEvent, AuditRepository, CreateRoleInput, GrantAssignmentInput};
pub use security_admin_service::{
    MANAGE_ASSIGNMENTS_PERMISSION, MANAGE_ROLES_PERMISSION, MANAGE_SYSTEM_ROLES_PERMISSION,
    SecurityAdminService,
};
pub use system_roles::{SUPER_ADMIN_ROLE_ID, builtin_roles};
