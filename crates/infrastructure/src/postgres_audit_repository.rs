use async_trait::async_trait;
use sitebeam_application::{AuditEvent, AuditRepository};
use sitebeam_domain::{AccessError, AccessResult};
use sqlx::PgPool;

/// PostgreSQL-backed append-only audit event sink.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AccessResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_audit_events (id, actor_id, action, resource_type, resource_id, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(event.actor_id.as_uuid())
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AccessError::DataAccessFailure(format!("failed to append audit event: {error}"))
        })?;

        Ok(())
    }
}
