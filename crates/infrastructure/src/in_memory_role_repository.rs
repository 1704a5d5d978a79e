use std::collections::HashMap;

use async_trait::async_trait;
use sitebeam_application::RoleRepository;
use sitebeam_domain::{AccessError, AccessResult, Role, RoleId};
use tokio::sync::RwLock;

/// In-memory role catalog adapter for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, role_id: &RoleId) -> AccessResult<Option<Role>> {
        Ok(self.roles.read().await.get(role_id).cloned())
    }

    async fn list_roles(&self) -> AccessResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(roles)
    }

    async fn insert_role(&self, role: &Role) -> AccessResult<()> {
        let mut roles = self.roles.write().await;
        if roles.contains_key(role.id()) {
            return Err(AccessError::RoleAlreadyExists(role.id().to_string()));
        }

        roles.insert(role.id().clone(), role.clone());
        Ok(())
    }

    async fn save_role(&self, role: &Role) -> AccessResult<()> {
        self.roles
            .write()
            .await
            .insert(role.id().clone(), role.clone());
        Ok(())
    }

    async fn delete_role(&self, role_id: &RoleId) -> AccessResult<()> {
        self.roles
            .write()
            .await
            .remove(role_id)
            .map(|_| ())
            .ok_or_else(|| AccessError::UnknownRole(role_id.to_string()))
    }
}
