use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sitebeam_core::{AppError, UserId, UserIdentity};
use sitebeam_domain::{
    AccessError, AccessResult, Assignment, BusinessUnitId, PermissionId, Role, RoleId, Scope,
};
use tokio::sync::Mutex;

use crate::{
    AccessDecision, AssignmentRepository, AuditEvent, AuditRepository, AuthorizationService,
    Clock, CreateRoleInput, DecisionCache, GrantAssignmentInput, PermissionRegistry,
    RoleRepository, builtin_roles,
};

use super::SecurityAdminService;

fn must<T, E: std::fmt::Debug>(value: Result<T, E>) -> T {
    match value {
        Ok(value) => value,
        Err(error) => panic!("test setup failed: {error:?}"),
    }
}

fn permission(value: &str) -> PermissionId {
    must(PermissionId::parse(value))
}

fn role_id(value: &str) -> RoleId {
    must(RoleId::parse(value))
}

fn unit(code: &str) -> Scope {
    Scope::Unit(must(BusinessUnitId::new(code)))
}

struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Default)]
struct FakeRoleRepository {
    roles: Mutex<HashMap<RoleId, Role>>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(&self, role_id: &RoleId) -> AccessResult<Option<Role>> {
        Ok(self.roles.lock().await.get(role_id).cloned())
    }

    async fn list_roles(&self) -> AccessResult<Vec<Role>> {
        Ok(self.roles.lock().await.values().cloned().collect())
    }

    async fn insert_role(&self, role: &Role) -> AccessResult<()> {
        let mut roles = self.roles.lock().await;
        if roles.contains_key(role.id()) {
            return Err(AccessError::RoleAlreadyExists(role.id().to_string()));
        }
        roles.insert(role.id().clone(), role.clone());
        Ok(())
    }

    async fn save_role(&self, role: &Role) -> AccessResult<()> {
        self.roles
            .lock()
            .await
            .insert(role.id().clone(), role.clone());
        Ok(())
    }

    async fn delete_role(&self, role_id: &RoleId) -> AccessResult<()> {
        self.roles
            .lock()
            .await
            .remove(role_id)
            .map(|_| ())
            .ok_or_else(|| AccessError::UnknownRole(role_id.to_string()))
    }
}

#[derive(Default)]
struct FakeAssignmentRepository {
    assignments: Mutex<Vec<Assignment>>,
}

#[async_trait]
impl AssignmentRepository for FakeAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AccessResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, assignment: Assignment) -> AccessResult<Assignment> {
        let mut assignments = self.assignments.lock().await;
        assignments.retain(|existing| {
            !(existing.user_id() == assignment.user_id()
                && existing.role_id() == assignment.role_id()
                && existing.scope() == assignment.scope())
        });
        assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn revoke(
        &self,
        user_id: UserId,
        role_id: &RoleId,
        scope: &Scope,
    ) -> AccessResult<bool> {
        let mut assignments = self.assignments.lock().await;
        for assignment in assignments.iter_mut() {
            if assignment.user_id() == user_id
                && assignment.role_id() == role_id
                && assignment.scope() == scope
            {
                assignment.revoke();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_for_role(&self, role_id: &RoleId) -> AccessResult<u64> {
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|assignment| assignment.role_id() != role_id);
        Ok((before - assignments.len()) as u64)
    }
}

#[derive(Default)]
struct RecordingDecisionCache {
    entries: Mutex<HashMap<(UserId, PermissionId, Scope), AccessDecision>>,
}

#[async_trait]
impl DecisionCache for RecordingDecisionCache {
    async fn get(
        &self,
        user_id: UserId,
        permission: &PermissionId,
        target: &Scope,
    ) -> AccessResult<Option<AccessDecision>> {
        Ok(self
            .entries
            .lock()
            .await
            .get(&(user_id, permission.clone(), target.clone()))
            .cloned())
    }

    async fn put(
        &self,
        user_id: UserId,
        permission: PermissionId,
        target: Scope,
        decision: AccessDecision,
    ) -> AccessResult<()> {
        self.entries
            .lock()
            .await
            .insert((user_id, permission, target), decision);
        Ok(())
    }

    async fn invalidate_user(&self, user_id: UserId) -> AccessResult<()> {
        self.entries
            .lock()
            .await
            .retain(|(cached_user, _, _), _| *cached_user != user_id);
        Ok(())
    }

    async fn invalidate_all(&self) -> AccessResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AccessResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

struct Harness {
    service: SecurityAdminService,
    authorization: AuthorizationService,
    role_repository: Arc<FakeRoleRepository>,
    assignment_repository: Arc<FakeAssignmentRepository>,
    audit_repository: Arc<FakeAuditRepository>,
    clock: Arc<ManualClock>,
    admin: UserIdentity,
}

async fn harness() -> Harness {
    let registry = Arc::new(must(PermissionRegistry::builtin()));
    let role_repository = Arc::new(FakeRoleRepository::default());
    for role in must(builtin_roles(&registry)) {
        must(role_repository.save_role(&role).await);
    }

    let assignment_repository = Arc::new(FakeAssignmentRepository::default());
    let cache = Arc::new(RecordingDecisionCache::default());
    let audit_repository = Arc::new(FakeAuditRepository::default());
    let clock = Arc::new(ManualClock::starting_at(Utc::now()));

    let admin_id = UserId::new();
    must(
        assignment_repository
            .upsert(Assignment::new(
                admin_id,
                role_id("super_admin"),
                Scope::Global,
                admin_id,
                clock.now(),
                None,
            ))
            .await,
    );

    let authorization = AuthorizationService::new(
        registry.clone(),
        role_repository.clone(),
        assignment_repository.clone(),
        cache.clone(),
        clock.clone(),
    );
    let service = SecurityAdminService::new(
        authorization.clone(),
        registry,
        role_repository.clone(),
        assignment_repository.clone(),
        cache,
        audit_repository.clone(),
        clock.clone(),
    );

    Harness {
        service,
        authorization,
        role_repository,
        assignment_repository,
        audit_repository,
        clock,
        admin: UserIdentity::new(admin_id, "Site Admin"),
    }
}

fn custom_role_input(id: &str, permissions: &[&str]) -> CreateRoleInput {
    CreateRoleInput {
        role_id: role_id(id),
        display_name: id.to_owned(),
        localized_name: None,
        privilege_level: 50,
        is_system: false,
        permissions: permissions.iter().map(|value| permission(value)).collect(),
    }
}

#[tokio::test]
async fn create_role_requires_manage_permission() {
    let harness = harness().await;
    let outsider = UserIdentity::new(UserId::new(), "outsider");

    let result = harness
        .service
        .create_role(&outsider, custom_role_input("site_clerk", &["projects:read"]))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn create_role_rejects_taken_id() {
    let harness = harness().await;

    let result = harness
        .service
        .create_role(&harness.admin, custom_role_input("viewer", &[]))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn create_role_rejects_unregistered_permission() {
    let harness = harness().await;

    let result = harness
        .service
        .create_role(
            &harness.admin,
            custom_role_input("site_clerk", &["projects:fly"]),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn grant_permission_is_idempotent() {
    let harness = harness().await;
    let site_clerk = role_id("site_clerk");
    let read = permission("projects:read");
    must(
        harness
            .service
            .create_role(&harness.admin, custom_role_input("site_clerk", &[]))
            .await,
    );
    let events_after_create = harness.audit_repository.events.lock().await.len();

    must(
        harness
            .service
            .grant_permission(&harness.admin, &site_clerk, &read)
            .await,
    );
    must(
        harness
            .service
            .grant_permission(&harness.admin, &site_clerk, &read)
            .await,
    );

    let role = must(harness.role_repository.find_role(&site_clerk).await);
    assert!(role.is_some_and(|role| role.permissions().len() == 1));

    // The second grant changed nothing and recorded nothing.
    let events = harness.audit_repository.events.lock().await;
    assert_eq!(events.len(), events_after_create + 1);
}

#[tokio::test]
async fn revoke_permission_propagates_to_decisions() {
    let harness = harness().await;
    let site_clerk = role_id("site_clerk");
    let read = permission("projects:read");
    must(
        harness
            .service
            .create_role(
                &harness.admin,
                custom_role_input("site_clerk", &["projects:read"]),
            )
            .await,
    );
    let user = UserId::new();
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: user,
                    role_id: site_clerk.clone(),
                    scope: unit("TPE"),
                    expires_at: None,
                },
            )
            .await,
    );

    let before = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(before.is_allowed());

    must(
        harness
            .service
            .revoke_permission(&harness.admin, &site_clerk, &read)
            .await,
    );

    let after = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(!after.is_allowed());
}

#[tokio::test]
async fn deactivating_system_roles_requires_system_manage_permission() {
    let harness = harness().await;
    let officer_id = UserId::new();
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: officer_id,
                    role_id: role_id("security_officer"),
                    scope: Scope::Global,
                    expires_at: None,
                },
            )
            .await,
    );
    let officer = UserIdentity::new(officer_id, "Security Officer");

    let result = harness
        .service
        .deactivate_role(&officer, &role_id("viewer"))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Custom roles need no extra privilege.
    must(
        harness
            .service
            .create_role(&harness.admin, custom_role_input("site_clerk", &[]))
            .await,
    );
    let result = harness
        .service
        .deactivate_role(&officer, &role_id("site_clerk"))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn deactivated_role_stops_contributing_permissions() {
    let harness = harness().await;
    let user = UserId::new();
    let read = permission("projects:read");
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: user,
                    role_id: role_id("viewer"),
                    scope: Scope::Global,
                    expires_at: None,
                },
            )
            .await,
    );

    let before = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(before.is_allowed());

    must(
        harness
            .service
            .deactivate_role(&harness.admin, &role_id("viewer"))
            .await,
    );

    let after = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(!after.is_allowed());
}

#[tokio::test]
async fn delete_role_rejects_system_roles() {
    let harness = harness().await;

    let result = harness
        .service
        .delete_role(&harness.admin, &role_id("viewer"))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn delete_role_cascades_assignment_removal() {
    let harness = harness().await;
    let user = UserId::new();
    must(
        harness
            .service
            .create_role(
                &harness.admin,
                custom_role_input("site_clerk", &["projects:read"]),
            )
            .await,
    );
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: user,
                    role_id: role_id("site_clerk"),
                    scope: unit("TPE"),
                    expires_at: None,
                },
            )
            .await,
    );

    must(
        harness
            .service
            .delete_role(&harness.admin, &role_id("site_clerk"))
            .await,
    );

    let remaining = must(harness.assignment_repository.list_for_user(user).await);
    assert!(remaining.is_empty());
    let role = must(harness.role_repository.find_role(&role_id("site_clerk")).await);
    assert!(role.is_none());
}

#[tokio::test]
async fn grant_assignment_rejects_unknown_role() {
    let harness = harness().await;

    let result = harness
        .service
        .grant_assignment(
            &harness.admin,
            GrantAssignmentInput {
                user_id: UserId::new(),
                role_id: role_id("ghost_role"),
                scope: Scope::Global,
                expires_at: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn grant_assignment_rejects_past_expiry() {
    let harness = harness().await;

    let result = harness
        .service
        .grant_assignment(
            &harness.admin,
            GrantAssignmentInput {
                user_id: UserId::new(),
                role_id: role_id("viewer"),
                scope: Scope::Global,
                expires_at: Some(harness.clock.now() - Duration::hours(1)),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn duplicate_grant_is_idempotent() {
    let harness = harness().await;
    let user = UserId::new();
    let input = GrantAssignmentInput {
        user_id: user,
        role_id: role_id("viewer"),
        scope: unit("TPE"),
        expires_at: None,
    };

    must(harness.service.grant_assignment(&harness.admin, input.clone()).await);
    must(harness.service.grant_assignment(&harness.admin, input).await);

    let assignments = must(
        harness
            .service
            .list_assignments_for_user(&harness.admin, user)
            .await,
    );
    assert_eq!(assignments.len(), 1);

    let decision = must(
        harness
            .authorization
            .authorize(user, &permission("projects:read"), &unit("TPE"))
            .await,
    );
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn revoke_then_authorize_is_denied_immediately() {
    let harness = harness().await;
    let user = UserId::new();
    let read = permission("projects:read");
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: user,
                    role_id: role_id("viewer"),
                    scope: unit("TPE"),
                    expires_at: None,
                },
            )
            .await,
    );

    // Warm the cache with an Allow.
    let before = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(before.is_allowed());

    must(
        harness
            .service
            .revoke_assignment(&harness.admin, user, &role_id("viewer"), &unit("TPE"))
            .await,
    );

    let after = must(harness.authorization.authorize(user, &read, &unit("TPE")).await);
    assert!(!after.is_allowed());

    // The revoked row stays visible to administrators.
    let assignments = must(
        harness
            .service
            .list_assignments_for_user(&harness.admin, user)
            .await,
    );
    assert!(assignments.iter().any(|assignment| !assignment.is_active()));
}

#[tokio::test]
async fn revoke_unknown_assignment_is_not_found() {
    let harness = harness().await;

    let result = harness
        .service
        .revoke_assignment(
            &harness.admin,
            UserId::new(),
            &role_id("viewer"),
            &unit("TPE"),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn admin_mutations_append_audit_events() {
    let harness = harness().await;
    must(
        harness
            .service
            .create_role(
                &harness.admin,
                custom_role_input("site_clerk", &["projects:read"]),
            )
            .await,
    );
    must(
        harness
            .service
            .grant_assignment(
                &harness.admin,
                GrantAssignmentInput {
                    user_id: UserId::new(),
                    role_id: role_id("site_clerk"),
                    scope: unit("TPE"),
                    expires_at: None,
                },
            )
            .await,
    );

    let events = harness.audit_repository.events.lock().await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.actor_id == harness.admin.user_id()));
}
