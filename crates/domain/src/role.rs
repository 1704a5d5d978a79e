use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use sitebeam_core::{AppError, AppResult, NonEmptyString};

use crate::PermissionId;

/// Short stable role identifier, e.g. `super_admin` or `project_manager`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(String);

impl RoleId {
    /// Parses a lowercase snake_case role identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        let starts_with_letter = value
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_lowercase());
        let well_formed = value
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_');

        if !starts_with_letter || !well_formed {
            return Err(AppError::Validation(format!(
                "role id '{value}' must be lowercase snake_case starting with a letter"
            )));
        }

        Ok(Self(value.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// A named set of permissions grantable to users.
///
/// `privilege_level` orders roles for display and sorting only; resolution
/// never consults it. System roles cannot be deleted and their ids are never
/// reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    display_name: String,
    localized_name: Option<String>,
    privilege_level: i16,
    is_system: bool,
    is_active: bool,
    permissions: BTreeSet<PermissionId>,
}

impl Role {
    /// Creates an active role with an empty permission set.
    pub fn new(
        id: RoleId,
        display_name: impl Into<String>,
        privilege_level: i16,
        is_system: bool,
    ) -> AppResult<Self> {
        let display_name = NonEmptyString::new(display_name).map_err(|_| {
            AppError::Validation(format!("role '{id}' requires a non-empty display name"))
        })?;

        Ok(Self {
            id,
            display_name: display_name.into(),
            localized_name: None,
            privilege_level,
            is_system,
            is_active: true,
            permissions: BTreeSet::new(),
        })
    }

    /// Reconstitutes a role from stored attributes.
    #[must_use]
    pub fn from_parts(
        id: RoleId,
        display_name: String,
        localized_name: Option<String>,
        privilege_level: i16,
        is_system: bool,
        is_active: bool,
        permissions: BTreeSet<PermissionId>,
    ) -> Self {
        Self {
            id,
            display_name,
            localized_name,
            privilege_level,
            is_system,
            is_active,
            permissions,
        }
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the localized display name, when one is set.
    #[must_use]
    pub fn localized_name(&self) -> Option<&str> {
        self.localized_name.as_deref()
    }

    /// Sets the localized display name.
    pub fn set_localized_name(&mut self, name: Option<String>) {
        self.localized_name = name;
    }

    /// Returns the display-ordering privilege level.
    #[must_use]
    pub fn privilege_level(&self) -> i16 {
        self.privilege_level
    }

    /// Returns whether this is a system-managed role.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns whether the role currently contributes permissions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the granted permission identifiers.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<PermissionId> {
        &self.permissions
    }

    /// Returns whether the role grants the permission.
    #[must_use]
    pub fn has_permission(&self, permission: &PermissionId) -> bool {
        self.permissions.contains(permission)
    }

    /// Adds a permission; granting twice is a no-op. Returns whether the set
    /// changed.
    pub fn grant(&mut self, permission: PermissionId) -> bool {
        self.permissions.insert(permission)
    }

    /// Removes a permission; revoking a not-granted permission is a no-op.
    /// Returns whether the set changed.
    pub fn revoke(&mut self, permission: &PermissionId) -> bool {
        self.permissions.remove(permission)
    }

    /// Marks the role inactive so it contributes no permissions.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Marks the role active again.
    pub fn activate(&mut self) {
        self.is_active = true;
    }
}
