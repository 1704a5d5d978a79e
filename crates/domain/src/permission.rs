use std::fmt::{Display, Formatter};
use std::str::FromStr;

use sitebeam_core::{AppError, AppResult};

/// Identifier of a single permission, written as `<module>:<action>`.
///
/// Both segments are lowercase `snake_case`, e.g. `projects:create` or
/// `finance:approve_payment`. The set of valid identifiers is closed and
/// owned by the permission registry; this type only guarantees the lexical
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionId {
    module: String,
    action: String,
}

impl PermissionId {
    /// Parses a `<module>:<action>` pair into a permission identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        let Some((module, action)) = value.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must have the form '<module>:<action>'"
            )));
        };

        validate_segment(module, "module", value)?;
        validate_segment(action, "action", value)?;

        Ok(Self {
            module: module.to_owned(),
            action: action.to_owned(),
        })
    }

    /// Returns the owning module segment.
    #[must_use]
    pub fn module(&self) -> &str {
        self.module.as_str()
    }

    /// Returns the action verb segment.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.module, self.action)
    }
}

impl FromStr for PermissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

fn validate_segment(segment: &str, part: &str, full: &str) -> AppResult<()> {
    let starts_with_letter = segment
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_lowercase());
    let well_formed = segment
        .chars()
        .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_');

    if !starts_with_letter || !well_formed {
        return Err(AppError::Validation(format!(
            "permission '{full}' has an invalid {part} segment: expected lowercase snake_case"
        )));
    }

    Ok(())
}

/// Catalog entry describing one registered permission.
///
/// Immutable once registered; the registry rejects conflicting
/// re-registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    id: PermissionId,
    display_name: String,
    description: String,
}

impl PermissionDefinition {
    /// Creates a catalog entry for a permission identifier.
    pub fn new(
        id: PermissionId,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "permission '{id}' requires a non-empty display name"
            )));
        }

        Ok(Self {
            id,
            display_name,
            description: description.into(),
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> &PermissionId {
        &self.id
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the owning module segment.
    #[must_use]
    pub fn module(&self) -> &str {
        self.id.module()
    }

    /// Returns the action verb segment.
    #[must_use]
    pub fn action(&self) -> &str {
        self.id.action()
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }
}
