use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crewdesk_application::ScopeDirectory;
use crewdesk_core::{AppError, AppResult};
use crewdesk_domain::RoleScope;

/// PostgreSQL-backed read-only lookup over the scope-entity tables.
#[derive(Clone)]
pub struct PostgresScopeDirectory {
    pool: PgPool,
}

impl PostgresScopeDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopeDirectory for PostgresScopeDirectory {
    async fn scope_exists(&self, scope: &RoleScope) -> AppResult<bool> {
        let (query, id) = match scope {
            RoleScope::Company => return Ok(true),
            RoleScope::Division(id) => (
                "SELECT EXISTS (SELECT 1 FROM divisions WHERE id = $1 AND deleted_at IS NULL)",
                *id,
            ),
            RoleScope::Team(id) => (
                "SELECT EXISTS (SELECT 1 FROM teams WHERE id = $1 AND deleted_at IS NULL)",
                *id,
            ),
            RoleScope::Project(id) => (
                "SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1 AND deleted_at IS NULL)",
                *id,
            ),
        };

        sqlx::query_scalar::<_, bool>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to resolve scope entity: {error}"))
            })
    }

    async fn scope_name(&self, scope: &RoleScope) -> AppResult<Option<String>> {
        let (query, id): (&str, Uuid) = match scope {
            RoleScope::Company => return Ok(None),
            RoleScope::Division(id) => (
                "SELECT name FROM divisions WHERE id = $1 AND deleted_at IS NULL",
                *id,
            ),
            RoleScope::Team(id) => (
                "SELECT name FROM teams WHERE id = $1 AND deleted_at IS NULL",
                *id,
            ),
            RoleScope::Project(id) => (
                "SELECT name FROM projects WHERE id = $1 AND deleted_at IS NULL",
                *id,
            ),
        };

        sqlx::query_scalar::<_, String>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to resolve scope name: {error}"))
            })
    }
}
