use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crewdesk_application::{NewAssignment, RoleAssignmentRepository, RoleHolder};
use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::{RoleAssignment, RoleId, RoleScope, ScopeType};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository over the role-assignment records.
#[derive(Clone)]
pub struct PostgresRoleAssignmentRepository {
    pool: PgPool,
}

impl PostgresRoleAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    role_name: String,
    scope_type: String,
    scope_id: Option<Uuid>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<RoleAssignment> {
        let scope_type = ScopeType::from_str(self.scope_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored scope type on assignment '{}': {error}",
                self.id
            ))
        })?;
        let scope = RoleScope::new(scope_type, self.scope_id).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored scope on assignment '{}': {error}",
                self.id
            ))
        })?;

        Ok(RoleAssignment {
            id: self.id,
            user_id: UserId::from_uuid(self.user_id),
            role_id: RoleId::from_uuid(self.role_id),
            role_name: self.role_name,
            scope,
            assigned_by: self.assigned_by.map(UserId::from_uuid),
            assigned_at: self.assigned_at,
            revoked_at: self.revoked_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InsertedRow {
    id: Uuid,
    assigned_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct HolderRow {
    user_id: Uuid,
    assigned_at: DateTime<Utc>,
}

#[async_trait]
impl RoleAssignmentRepository for PostgresRoleAssignmentRepository {
    async fn insert(&self, assignment: NewAssignment) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, InsertedRow>(
            r#"
            INSERT INTO role_assignments (user_id, role_id, scope_type, scope_id, assigned_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at AS assigned_at
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.scope.kind().as_str())
        .bind(assignment.scope.entity_id())
        .bind(assignment.assigned_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_assignment_conflict(error, &assignment))?;

        Ok(RoleAssignment {
            id: row.id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            role_name: assignment.role_name,
            scope: assignment.scope,
            assigned_by: Some(assignment.assigned_by),
            assigned_at: row.assigned_at,
            revoked_at: None,
        })
    }

    async fn revoke(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: &RoleScope,
        revoked_by: UserId,
    ) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            UPDATE role_assignments AS assignments
            SET revoked_at = now(), revoked_by = $5
            FROM roles
            WHERE roles.id = assignments.role_id
                AND assignments.user_id = $1
                AND assignments.role_id = $2
                AND assignments.scope_type = $3
                AND assignments.scope_id IS NOT DISTINCT FROM $4
                AND assignments.revoked_at IS NULL
            RETURNING
                assignments.id,
                assignments.user_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope_type,
                assignments.scope_id,
                assignments.assigned_by,
                assignments.created_at AS assigned_at,
                assignments.revoked_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .bind(revoked_by.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke assignment: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "live role assignment for user '{user_id}' in {scope} was not found"
            ))
        })?;

        row.into_assignment()
    }

    async fn find_live(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: &RoleScope,
    ) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.id,
                assignments.user_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope_type,
                assignments.scope_id,
                assignments.assigned_by,
                assignments.created_at AS assigned_at,
                assignments.revoked_at
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.role_id = $2
                AND assignments.scope_type = $3
                AND assignments.scope_id IS NOT DISTINCT FROM $4
                AND assignments.revoked_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find assignment: {error}")))?;

        row.map(AssignmentRow::into_assignment).transpose()
    }

    async fn list_live_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.id,
                assignments.user_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope_type,
                assignments.scope_id,
                assignments.assigned_by,
                assignments.created_at AS assigned_at,
                assignments.revoked_at
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
                AND roles.deleted_at IS NULL
            WHERE assignments.user_id = $1
                AND assignments.revoked_at IS NULL
            ORDER BY assignments.scope_type, assignments.scope_id, assignments.created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        rows.into_iter()
            .map(AssignmentRow::into_assignment)
            .collect()
    }

    async fn list_live_by_scope(
        &self,
        user_id: UserId,
        scope: &RoleScope,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.id,
                assignments.user_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope_type,
                assignments.scope_id,
                assignments.assigned_by,
                assignments.created_at AS assigned_at,
                assignments.revoked_at
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
                AND roles.deleted_at IS NULL
            WHERE assignments.user_id = $1
                AND assignments.scope_type = $2
                AND assignments.scope_id IS NOT DISTINCT FROM $3
                AND assignments.revoked_at IS NULL
            ORDER BY assignments.created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        rows.into_iter()
            .map(AssignmentRow::into_assignment)
            .collect()
    }

    async fn list_live_holders(
        &self,
        role_name: &str,
        scope: &RoleScope,
    ) -> AppResult<Vec<RoleHolder>> {
        let rows = sqlx::query_as::<_, HolderRow>(
            r#"
            SELECT
                assignments.user_id,
                assignments.created_at AS assigned_at
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
                AND roles.deleted_at IS NULL
            INNER JOIN users
                ON users.id = assignments.user_id
                AND users.deleted_at IS NULL
            WHERE roles.name = $1
                AND assignments.scope_type = $2
                AND assignments.scope_id IS NOT DISTINCT FROM $3
                AND assignments.revoked_at IS NULL
            ORDER BY assignments.created_at DESC
            "#,
        )
        .bind(role_name)
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role holders: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleHolder {
                user_id: UserId::from_uuid(row.user_id),
                assigned_at: row.assigned_at,
            })
            .collect())
    }
}

fn map_assignment_conflict(error: sqlx::Error, assignment: &NewAssignment) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "user '{}' already holds role '{}' in {}",
            assignment.user_id, assignment.role_name, assignment.scope
        ));
    }

    AppError::Internal(format!("failed to insert assignment: {error}"))
}
