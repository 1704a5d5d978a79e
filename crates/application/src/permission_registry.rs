use std::collections::BTreeMap;

use sitebeam_core::AppResult;
use sitebeam_domain::{AccessError, AccessResult, PermissionDefinition, PermissionId};

/// Closed catalog of permission identifiers.
///
/// Built once before the server starts and shared immutably afterwards;
/// resolution rejects any permission id the registry does not know.
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    definitions: BTreeMap<PermissionId, PermissionDefinition>,
}

impl PermissionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry preloaded with the deployment catalog.
    pub fn builtin() -> AppResult<Self> {
        let mut registry = Self::new();
        for (id, display_name, description) in BUILTIN_CATALOG {
            let id = PermissionId::parse(id)?;
            let definition = PermissionDefinition::new(id, *display_name, *description)?;
            registry.register(definition)?;
        }

        Ok(registry)
    }

    /// Registers a permission definition.
    ///
    /// Re-registering an identical definition is a no-op; the same id with a
    /// different definition fails with `DuplicateIdentifier`.
    pub fn register(&mut self, definition: PermissionDefinition) -> AccessResult<()> {
        if let Some(existing) = self.definitions.get(definition.id()) {
            if existing == &definition {
                return Ok(());
            }

            return Err(AccessError::DuplicateIdentifier(definition.id().to_string()));
        }

        self.definitions.insert(definition.id().clone(), definition);
        Ok(())
    }

    /// Returns the definition for a permission id.
    pub fn lookup(&self, id: &PermissionId) -> AccessResult<&PermissionDefinition> {
        self.definitions
            .get(id)
            .ok_or_else(|| AccessError::UnknownPermission(id.to_string()))
    }

    /// Returns whether the id is registered.
    #[must_use]
    pub fn contains(&self, id: &PermissionId) -> bool {
        self.definitions.contains_key(id)
    }

    /// Iterates over every registered definition in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionDefinition> {
        self.definitions.values()
    }

    /// Returns the number of registered permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

const BUILTIN_CATALOG: &[(&str, &str, &str)] = &[
    (
        "projects:create",
        "Create projects",
        "Create construction project records",
    ),
    ("projects:read", "View projects", "View project records"),
    ("projects:update", "Edit projects", "Modify project records"),
    ("projects:delete", "Delete projects", "Remove project records"),
    (
        "contracts:create",
        "Create contracts",
        "Create contract records",
    ),
    ("contracts:read", "View contracts", "View contract records"),
    ("contracts:update", "Edit contracts", "Modify contract records"),
    ("contracts:delete", "Delete contracts", "Remove contract records"),
    (
        "contracts:approve",
        "Approve contracts",
        "Approve contract drafts for signature",
    ),
    (
        "finance:create",
        "Create finance entries",
        "Create budget and payment entries",
    ),
    (
        "finance:read",
        "View finance entries",
        "View budget and payment entries",
    ),
    (
        "finance:update",
        "Edit finance entries",
        "Modify budget and payment entries",
    ),
    (
        "finance:delete",
        "Delete finance entries",
        "Remove budget and payment entries",
    ),
    (
        "finance:approve_payment",
        "Approve payments",
        "Approve outgoing payment requests",
    ),
    (
        "procurement:create",
        "Create purchase orders",
        "Create procurement orders and requests",
    ),
    (
        "procurement:read",
        "View purchase orders",
        "View procurement orders and requests",
    ),
    (
        "procurement:update",
        "Edit purchase orders",
        "Modify procurement orders and requests",
    ),
    (
        "procurement:delete",
        "Delete purchase orders",
        "Remove procurement orders and requests",
    ),
    (
        "procurement:approve_order",
        "Approve purchase orders",
        "Approve procurement orders for issue",
    ),
    (
        "regulations:create",
        "Create regulation records",
        "Create regulatory compliance records",
    ),
    (
        "regulations:read",
        "View regulation records",
        "View regulatory compliance records",
    ),
    (
        "regulations:update",
        "Edit regulation records",
        "Modify regulatory compliance records",
    ),
    (
        "regulations:delete",
        "Delete regulation records",
        "Remove regulatory compliance records",
    ),
    (
        "notifications:read",
        "View notifications",
        "View notification history",
    ),
    (
        "notifications:send",
        "Send notifications",
        "Send notifications to users",
    ),
    ("reports:read", "View reports", "View operational reports"),
    (
        "reports:export",
        "Export reports",
        "Export reports to external formats",
    ),
    (
        "security:manage_roles",
        "Manage roles",
        "Create, edit and retire roles",
    ),
    (
        "security:manage_assignments",
        "Manage assignments",
        "Grant and revoke user-role assignments",
    ),
    (
        "security:manage_system_roles",
        "Manage system roles",
        "Deactivate system-managed roles",
    ),
    (
        "security:read_audit",
        "Read audit trail",
        "View security audit events",
    ),
];
