use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crewdesk_application::RoleCatalog;
use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::{RoleId, RoleRecord};

/// PostgreSQL-backed repository over role definitions and the
/// role-permission link.
#[derive(Clone)]
pub struct PostgresRoleCatalog {
    pool: PgPool,
}

impl PostgresRoleCatalog {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            name: row.name,
        }
    }
}

#[async_trait]
impl RoleCatalog for PostgresRoleCatalog {
    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(row.map(RoleRecord::from))
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = $1 AND deleted_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(row.map(RoleRecord::from))
    }

    async fn list_permission_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT permissions.name
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
                AND roles.deleted_at IS NULL
            INNER JOIN role_permissions
                ON role_permissions.role_id = assignments.role_id
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
                AND permissions.deleted_at IS NULL
            WHERE assignments.user_id = $1
                AND assignments.revoked_at IS NULL
            ORDER BY permissions.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve permissions: {error}")))
    }
}
