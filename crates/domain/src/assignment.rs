use chrono::{DateTime, Utc};
use sitebeam_core::UserId;

use crate::{RoleId, Scope};

/// A grant of one role to one user at one scope.
///
/// The `(user_id, role_id, scope)` triple is unique; granting the same role
/// at the same scope twice is idempotent, not additive. Revocation is soft:
/// the row stays for administrative display, with `is_active` cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    user_id: UserId,
    role_id: RoleId,
    scope: Scope,
    is_active: bool,
    granted_by: UserId,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Creates an active assignment.
    #[must_use]
    pub fn new(
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
        granted_by: UserId,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            role_id,
            scope,
            is_active: true,
            granted_by,
            granted_at,
            expires_at,
        }
    }

    /// Reconstitutes an assignment from stored attributes.
    #[must_use]
    pub fn from_parts(
        user_id: UserId,
        role_id: RoleId,
        scope: Scope,
        is_active: bool,
        granted_by: UserId,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            role_id,
            scope,
            is_active,
            granted_by,
            granted_at,
            expires_at,
        }
    }

    /// Returns the user holding the assignment.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the scope the grant applies to.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns whether the assignment has not been revoked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the administrator who granted the assignment.
    #[must_use]
    pub fn granted_by(&self) -> UserId {
        self.granted_by
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the expiry timestamp, when one is set.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns whether the assignment contributes permissions at `now`:
    /// active and not yet expired.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Returns whether the grant covers the requested target scope.
    #[must_use]
    pub fn applies_to(&self, target: &Scope) -> bool {
        self.scope.covers(target)
    }

    /// Marks the assignment revoked.
    pub fn revoke(&mut self) {
        self.is_active = false;
    }

    /// Reactivates the assignment with fresh grant metadata.
    pub fn regrant(
        &mut self,
        granted_by: UserId,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.is_active = true;
        self.granted_by = granted_by;
        self.granted_at = granted_at;
        self.expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sitebeam_core::UserId;

    use super::Assignment;
    use crate::{RoleId, Scope};

    fn assignment(expires_in_hours: Option<i64>) -> Option<Assignment> {
        let role_id = RoleId::parse("project_manager").ok()?;
        let now = Utc::now();
        Some(Assignment::new(
            UserId::new(),
            role_id,
            Scope::Global,
            UserId::new(),
            now,
            expires_in_hours.map(|hours| now + Duration::hours(hours)),
        ))
    }

    #[test]
    fn assignment_without_expiry_stays_valid() {
        let Some(assignment) = assignment(None) else {
            return;
        };
        assert!(assignment.is_valid_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn assignment_expires_at_boundary() {
        let Some(assignment) = assignment(Some(1)) else {
            return;
        };
        let now = Utc::now();
        assert!(assignment.is_valid_at(now));
        assert!(!assignment.is_valid_at(now + Duration::hours(2)));
    }

    #[test]
    fn revoked_assignment_is_invalid_even_before_expiry() {
        let Some(mut assignment) = assignment(Some(1)) else {
            return;
        };
        assignment.revoke();
        assert!(!assignment.is_valid_at(Utc::now()));
    }

    #[test]
    fn regrant_reactivates_and_refreshes_metadata() {
        let Some(mut assignment) = assignment(None) else {
            return;
        };
        assignment.revoke();

        let admin = UserId::new();
        let now = Utc::now();
        assignment.regrant(admin, now, None);

        assert!(assignment.is_active());
        assert_eq!(assignment.granted_by(), admin);
        assert_eq!(assignment.granted_at(), now);
    }
}
