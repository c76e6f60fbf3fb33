use async_trait::async_trait;
use sqlx::PgPool;

use crewdesk_application::{AuditEvent, AuditRepository};
use crewdesk_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
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
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (
                subject_type,
                subject_id,
                causer_type,
                causer_id,
                event,
                description,
                properties
            )
            VALUES ($1, $2, 'user', $3, $4, $5, $6)
            "#,
        )
        .bind(event.subject_type)
        .bind(event.subject_id)
        .bind(event.causer_id.map(|causer| causer.as_uuid()))
        .bind(event.action.as_str())
        .bind(event.description)
        .bind(event.properties)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
