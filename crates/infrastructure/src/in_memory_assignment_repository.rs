use std::collections::HashMap;

use async_trait::async_trait;
use sitebeam_application::AssignmentRepository;
use sitebeam_core::UserId;
use sitebeam_domain::{AccessResult, Assignment, RoleId, Scope};
use tokio::sync::RwLock;

/// In-memory assignment store adapter for tests and single-process
/// deployments.
///
/// All writers take the single write lock, so racing grants for the same
/// triple collapse to one row.
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<UserId, Vec<Assignment>>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty assignment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AccessResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, assignment: Assignment) -> AccessResult<Assignment> {
        let mut assignments = self.assignments.write().await;
        let rows = assignments.entry(assignment.user_id()).or_default();
        rows.retain(|existing| {
            !(existing.role_id() == assignment.role_id()
                && existing.scope() == assignment.scope())
        });
        rows.push(assignment.clone());
        Ok(assignment)
    }

    async fn revoke(
        &self,
        user_id: UserId,
        role_id: &RoleId,
        scope: &Scope,
    ) -> AccessResult<bool> {
        let mut assignments = self.assignments.write().await;
        let Some(rows) = assignments.get_mut(&user_id) else {
            return Ok(false);
        };

        for assignment in rows.iter_mut() {
            if assignment.role_id() == role_id && assignment.scope() == scope {
                assignment.revoke();
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn delete_for_role(&self, role_id: &RoleId) -> AccessResult<u64> {
        let mut assignments = self.assignments.write().await;
        let mut removed = 0u64;
        for rows in assignments.values_mut() {
            let before = rows.len();
            rows.retain(|assignment| assignment.role_id() != role_id);
            removed += (before - rows.len()) as u64;
        }
        assignments.retain(|_, rows| !rows.is_empty());

        Ok(removed)
    }
}
