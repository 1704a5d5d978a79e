use std::fmt::{Display, Formatter};
use std::str::FromStr;

use sitebeam_core::{AppError, AppResult};

/// Storage and transport sentinel for the global scope.
pub const GLOBAL_SCOPE_SENTINEL: &str = "*";

/// Identifier of a business unit, e.g. `"TPE"` or `"KHH"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusinessUnitId(String);

impl BusinessUnitId {
    /// Creates a validated business-unit identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "business unit id must not be empty".to_owned(),
            ));
        }
        if value == GLOBAL_SCOPE_SENTINEL {
            return Err(AppError::Validation(
                "business unit id must not be the global sentinel '*'".to_owned(),
            ));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "business unit id '{value}' must not contain whitespace"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for BusinessUnitId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Business-unit boundary an assignment or an authorization target applies to.
///
/// Replaces the `"*"` magic string: the global scope is its own variant and
/// can never be confused with a unit code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Applies to every business unit.
    Global,
    /// Applies to exactly one business unit.
    Unit(BusinessUnitId),
}

impl Scope {
    /// Parses the storage value: the `"*"` sentinel or a unit code.
    pub fn parse(value: &str) -> AppResult<Self> {
        if value == GLOBAL_SCOPE_SENTINEL {
            return Ok(Self::Global);
        }

        Ok(Self::Unit(BusinessUnitId::new(value)?))
    }

    /// Returns the stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Global => GLOBAL_SCOPE_SENTINEL,
            Self::Unit(unit) => unit.as_str(),
        }
    }

    /// Returns whether a grant at this scope covers the requested target.
    ///
    /// A global grant covers every target; a unit grant covers only the same
    /// unit. A unit grant never covers the global target, so unit-local
    /// administrators cannot reach organization-wide operations.
    #[must_use]
    pub fn covers(&self, target: &Scope) -> bool {
        match self {
            Self::Global => true,
            Self::Unit(unit) => matches!(target, Self::Unit(requested) if requested == unit),
        }
    }

    /// Returns true for the global scope.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
