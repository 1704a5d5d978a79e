use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sitebeam_application::RoleRepository;
use sitebeam_domain::{AccessError, AccessResult, PermissionId, Role, RoleId};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed role catalog adapter.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: String,
    display_name: String,
    localized_name: Option<String>,
    privilege_level: i16,
    is_system: bool,
    is_active: bool,
    permission: Option<String>,
}

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id,
        roles.display_name,
        roles.localized_name,
        roles.privilege_level,
        roles.is_system,
        roles.is_active,
        grants.permission
    FROM rbac_roles AS roles
    LEFT JOIN rbac_role_grants AS grants
        ON grants.role_id = roles.id
"#;

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, role_id: &RoleId) -> AccessResult<Option<Role>> {
        let query = format!("{ROLE_SELECT} WHERE roles.id = $1 ORDER BY grants.permission");
        let rows = sqlx::query_as::<_, RoleRow>(query.as_str())
            .bind(role_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!("failed to load role: {error}"))
            })?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    async fn list_roles(&self) -> AccessResult<Vec<Role>> {
        let query = format!("{ROLE_SELECT} ORDER BY roles.id, grants.permission");
        let rows = sqlx::query_as::<_, RoleRow>(query.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!("failed to list roles: {error}"))
            })?;

        aggregate_roles(rows)
    }

    async fn insert_role(&self, role: &Role) -> AccessResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, display_name, localized_name, privilege_level, is_system, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(role.id().as_str())
        .bind(role.display_name())
        .bind(role.localized_name())
        .bind(role.privilege_level())
        .bind(role.is_system())
        .bind(role.is_active())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, role.id()))?;

        persist_grants(&mut transaction, role).await?;

        transaction.commit().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to commit transaction: {error}"))
        })
    }

    async fn save_role(&self, role: &Role) -> AccessResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, display_name, localized_name, privilege_level, is_system, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                localized_name = EXCLUDED.localized_name,
                privilege_level = EXCLUDED.privilege_level,
                is_system = EXCLUDED.is_system,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(role.id().as_str())
        .bind(role.display_name())
        .bind(role.localized_name())
        .bind(role.privilege_level())
        .bind(role.is_system())
        .bind(role.is_active())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to save role: {error}"))
        })?;

        sqlx::query("DELETE FROM rbac_role_grants WHERE role_id = $1")
            .bind(role.id().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!("failed to clear role grants: {error}"))
            })?;

        persist_grants(&mut transaction, role).await?;

        transaction.commit().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to commit transaction: {error}"))
        })
    }

    async fn delete_role(&self, role_id: &RoleId) -> AccessResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query("DELETE FROM rbac_role_grants WHERE role_id = $1")
            .bind(role_id.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!("failed to clear role grants: {error}"))
            })?;

        let rows_affected = sqlx::query("DELETE FROM rbac_roles WHERE id = $1")
            .bind(role_id.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!("failed to delete role: {error}"))
            })?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AccessError::UnknownRole(role_id.to_string()));
        }

        transaction.commit().await.map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to commit transaction: {error}"))
        })
    }
}

async fn persist_grants(
    transaction: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    role: &Role,
) -> AccessResult<()> {
    for permission in role.permissions() {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_grants (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role.id().as_str())
        .bind(permission.to_string())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to persist role grants: {error}"))
        })?;
    }

    Ok(())
}

struct PendingRole {
    display_name: String,
    localized_name: Option<String>,
    privilege_level: i16,
    is_system: bool,
    is_active: bool,
    permissions: BTreeSet<PermissionId>,
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AccessResult<Vec<Role>> {
    let mut by_id: HashMap<String, PendingRole> = HashMap::new();

    for row in rows {
        let RoleRow {
            id,
            display_name,
            localized_name,
            privilege_level,
            is_system,
            is_active,
            permission,
        } = row;
        let pending = by_id.entry(id).or_insert_with(|| PendingRole {
            display_name,
            localized_name,
            privilege_level,
            is_system,
            is_active,
            permissions: BTreeSet::new(),
        });

        if let Some(permission) = permission {
            let permission = PermissionId::parse(permission.as_str()).map_err(|error| {
                AccessError::DataAccessFailure(format!(
                    "invalid stored permission '{permission}': {error}"
                ))
            })?;
            pending.permissions.insert(permission);
        }
    }

    let mut roles = Vec::with_capacity(by_id.len());
    for (id, pending) in by_id {
        let role_id = RoleId::parse(id.as_str()).map_err(|error| {
            AccessError::DataAccessFailure(format!("invalid stored role id '{id}': {error}"))
        })?;
        roles.push(Role::from_parts(
            role_id,
            pending.display_name,
            pending.localized_name,
            pending.privilege_level,
            pending.is_system,
            pending.is_active,
            pending.permissions,
        ));
    }

    roles.sort_by(|left, right| left.id().cmp(right.id()));
    Ok(roles)
}

fn map_role_conflict(error: sqlx::Error, role_id: &RoleId) -> AccessError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AccessError::RoleAlreadyExists(role_id.to_string());
    }

    AccessError::DataAccessFailure(format!("failed to create role: {error}"))
}
