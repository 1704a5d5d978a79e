use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sitebeam_application::AssignmentRepository;
use sitebeam_core::UserId;
use sitebeam_domain::{AccessError, AccessResult, Assignment, RoleId, Scope};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed assignment store adapter.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: uuid::Uuid,
    role_id: String,
    scope: String,
    is_active: bool,
    granted_by: uuid::Uuid,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    fn into_assignment(self) -> AccessResult<Assignment> {
        let role_id = RoleId::parse(self.role_id.as_str()).map_err(|error| {
            AccessError::DataAccessFailure(format!(
                "invalid stored role id '{}': {error}",
                self.role_id
            ))
        })?;
        let scope = Scope::parse(self.scope.as_str()).map_err(|error| {
            AccessError::DataAccessFailure(format!(
                "invalid stored scope '{}': {error}",
                self.scope
            ))
        })?;

        Ok(Assignment::from_parts(
            UserId::from_uuid(self.user_id),
            role_id,
            scope,
            self.is_active,
            UserId::from_uuid(self.granted_by),
            self.granted_at,
            self.expires_at,
        ))
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> AccessResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, role_id, scope, is_active, granted_by, granted_at, expires_at
            FROM rbac_assignments
            WHERE user_id = $1
            ORDER BY role_id, scope
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to list assignments: {error}"))
        })?;

        rows.into_iter().map(AssignmentRow::into_assignment).collect()
    }

    async fn upsert(&self, assignment: Assignment) -> AccessResult<Assignment> {
        // The row-level conflict update serializes racing grants for the
        // same triple; the unique key is the composite primary key.
        sqlx::query(
            r#"
            INSERT INTO rbac_assignments
                (user_id, role_id, scope, is_active, granted_by, granted_at, expires_at)
            VALUES ($1, $2, $3, TRUE, $4, $5, $6)
            ON CONFLICT (user_id, role_id, scope) DO UPDATE
            SET is_active = TRUE,
                granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(assignment.user_id().as_uuid())
        .bind(assignment.role_id().as_str())
        .bind(assignment.scope().as_str())
        .bind(assignment.granted_by().as_uuid())
        .bind(assignment.granted_at())
        .bind(assignment.expires_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to upsert assignment: {error}"))
        })?;

        Ok(assignment)
    }

    async fn revoke(
        &self,
        user_id: UserId,
        role_id: &RoleId,
        scope: &Scope,
    ) -> AccessResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE rbac_assignments
            SET is_active = FALSE
            WHERE user_id = $1 AND role_id = $2 AND scope = $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_str())
        .bind(scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to revoke assignment: {error}"))
        })?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn delete_for_role(&self, role_id: &RoleId) -> AccessResult<u64> {
        let rows_affected = sqlx::query("DELETE FROM rbac_assignments WHERE role_id = $1")
            .bind(role_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AccessError::DataAccessFailure(format!(
                    "failed to delete role assignments: {error}"
                ))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}
