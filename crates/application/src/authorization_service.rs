use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sitebeam_core::{AppError, AppResult, UserId};
use sitebeam_domain::{AccessResult, Assignment, PermissionId, Role, RoleId, Scope};

use crate::{Clock, PermissionRegistry};

/// Origin of a granted decision: the assignment that supplied the permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantProvenance {
    /// Role that granted the permission.
    pub role_id: RoleId,
    /// Scope of the matching assignment.
    pub scope: Scope,
    /// Administrator who granted the assignment.
    pub granted_by: UserId,
    /// Grant timestamp of the matching assignment.
    pub granted_at: DateTime<Utc>,
}

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access granted; carries the matching assignment for the caller's
    /// audit logging.
    Allow {
        /// Assignment that supplied the permission.
        provenance: GrantProvenance,
    },
    /// Access denied.
    Deny {
        /// Human-readable denial reason.
        reason: String,
    },
}

impl AccessDecision {
    /// Returns true when access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Where a guarded operation's scope target comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// The operation is organization-wide.
    Global,
    /// The operation targets the business unit named by the request.
    RequestUnit,
}

/// Access requirement declared for one guarded operation.
///
/// The routing table maps each protected operation to one of these; the
/// guard reads it, resolves the target scope and calls the engine. This
/// replaces per-handler permission metadata.
#[derive(Debug, Clone)]
pub struct AccessRequirement {
    /// Permission the operation requires.
    pub permission: PermissionId,
    /// Where the target scope comes from.
    pub target_source: TargetSource,
}

impl AccessRequirement {
    /// Declares an organization-wide requirement.
    #[must_use]
    pub fn global(permission: PermissionId) -> Self {
        Self {
            permission,
            target_source: TargetSource::Global,
        }
    }

    /// Declares a requirement scoped to the request's business unit.
    #[must_use]
    pub fn unit_scoped(permission: PermissionId) -> Self {
        Self {
            permission,
            target_source: TargetSource::RequestUnit,
        }
    }
}

/// Repository port for the role catalog.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by id.
    async fn find_role(&self, role_id: &RoleId) -> AccessResult<Option<Role>>;

    /// Lists every role in the catalog.
    async fn list_roles(&self) -> AccessResult<Vec<Role>>;

    /// Inserts a new role; fails with `RoleAlreadyExists` when the id is taken.
    async fn insert_role(&self, role: &Role) -> AccessResult<()>;

    /// Persists the current state of an existing role.
    async fn save_role(&self, role: &Role) -> AccessResult<()>;

    /// Removes a role; fails with `UnknownRole` when the id is unknown.
    async fn delete_role(&self, role_id: &RoleId) -> AccessResult<()>;
}

/// Repository port for user-role assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Returns every assignment for one user, active and revoked.
    async fn list_for_user(&self, user_id: UserId) -> AccessResult<Vec<Assignment>>;

    /// Inserts or refreshes the unique `(user, role, scope)` triple.
    ///
    /// Upserts for the same user are serialized by the adapter so concurrent
    /// grants cannot produce duplicate triples.
    async fn upsert(&self, assignment: Assignment) -> AccessResult<Assignment>;

    /// Soft-revokes one triple; returns whether a row was affected.
    async fn revoke(&self, user_id: UserId, role_id: &RoleId, scope: &Scope) -> AccessResult<bool>;

    /// Physically removes all assignments referencing a role; returns the
    /// number of removed rows.
    async fn delete_for_role(&self, role_id: &RoleId) -> AccessResult<u64>;
}

/// Cache port memoizing authorization decisions per principal.
#[async_trait]
pub trait DecisionCache: Send + Sync {
    /// Returns the cached decision for the exact check, when still fresh.
    async fn get(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AccessResult<Option<AccessDecision>>;

    /// Stores the decision for the exact check.
    async fn put(
        &self,
        user_id: UserId,
        permission: PermissionId,
        target: Scope,
        decision: AccessDecision,
    ) -> AccessResult<()>;

    /// Drops every cached decision for one user.
    async fn invalidate_user(&self, user_id: UserId) -> AccessResult<()>;

    /// Drops every cached decision.
    async fn invalidate_all(&self) -> AccessResult<()>;
}

/// Resolution engine deciding `(user, permission, scope)` checks.
///
/// Fail-closed: a user with no valid assignment covering the target scope is
/// denied, and nothing but explicit permission membership in an active role
/// grants access.
#[derive(Clone)]
pub struct AuthorizationService {
    registry: Arc<PermissionRegistry>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    decision_cache: Arc<dyn DecisionCache>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationService {
    /// Creates the engine from its ports.
    #[must_use]
    pub fn new(
        registry: Arc<PermissionRegistry>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        decision_cache: Arc<dyn DecisionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            role_repository,
            assignment_repository,
            decision_cache,
            clock,
        }
    }

    /// Decides whether the user holds the permission at the target scope.
    ///
    /// An unregistered permission id is a caller bug and surfaces as
    /// `UnknownPermission` instead of being coerced into a denial.
    pub async fn authorize(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AccessResult<AccessDecision> {
        self.registry.lookup(permission)?;

        if let Some(decision) = self
            .decision_cache
            .get(user_id, permission, target)
            .await?
        {
            return Ok(decision);
        }

        let decision = self.resolve(user_id, permission, target).await?;
        self.decision_cache
            .put(user_id, permission.clone(), target.clone(), decision.clone())
            .await?;

        Ok(decision)
    }

    /// Guard-facing wrapper converting a denial into `AppError::Forbidden`.
    pub async fn require(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AppResult<()> {
        match self.authorize(user_id, permission, target).await? {
            AccessDecision::Allow { .. } => Ok(()),
            AccessDecision::Deny { reason } => Err(AppError::Forbidden(format!(
                "user '{user_id}' is missing permission '{permission}' at scope '{target}': {reason}"
            ))),
        }
    }

    async fn resolve(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AccessResult<AccessDecision> {
        let now = self.clock.now();
        let assignments = self.assignment_repository.list_for_user(user_id).await?;

        // Scope is matched per assignment: a unit-scoped grant never widens
        // through a globally scoped grant of an unrelated role.
        let candidates = assignments
            .into_iter()
            .filter(|assignment| assignment.is_valid_at(now) && assignment.applies_to(target))
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            return Ok(AccessDecision::Deny {
                reason: format!("no valid assignment covers scope '{target}'"),
            });
        }

        for assignment in &candidates {
            let Some(role) = self.role_repository.find_role(assignment.role_id()).await? else {
                continue;
            };
            if !role.is_active() {
                continue;
            }
            if role.has_permission(permission) {
                return Ok(AccessDecision::Allow {
                    provenance: GrantProvenance {
                        role_id: assignment.role_id().clone(),
                        scope: assignment.scope().clone(),
                        granted_by: assignment.granted_by(),
                        granted_at: assignment.granted_at(),
                    },
                });
            }
        }

        Ok(AccessDecision::Deny {
            reason: format!("permission '{permission}' is not granted at scope '{target}'"),
        })
    }
}
