/// Stable audit actions emitted by administrative use-cases.
///
/// The audit subsystem is an external consumer; this enum only fixes the
/// stable identifiers written through the audit port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is deactivated.
    RoleDeactivated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a permission is granted to a role.
    RolePermissionGranted,
    /// Emitted when a permission is revoked from a role.
    RolePermissionRevoked,
    /// Emitted when a role is assigned to a user.
    AssignmentGranted,
    /// Emitted when a user-role assignment is revoked.
    AssignmentRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "security.role.created",
            Self::RoleDeactivated => "security.role.deactivated",
            Self::RoleDeleted => "security.role.deleted",
            Self::RolePermissionGranted => "security.role.permission_granted",
            Self::RolePermissionRevoked => "security.role.permission_revoked",
            Self::AssignmentGranted => "security.assignment.granted",
            Self::AssignmentRevoked => "security.assignment.revoked",
        }
    }
}
