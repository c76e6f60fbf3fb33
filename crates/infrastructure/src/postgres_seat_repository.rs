use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crewdesk_application::{SeatInstallation, SeatRepository, SeatVacancy};
use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::{AuditAction, RoleAssignment, RoleId, RoleRecord, RoleScope, ScopeType};


/// PostgreSQL-backed transactional adapter for the exclusive seat roles.
///
/// Concurrent calls for the same scope serialize on a `FOR UPDATE` lock of
/// the scope-entity row, so two near-simultaneous installations cannot both
/// commit a live holder.
#[derive(Clone)]
pub struct PostgresSeatRepository {
    pool: PgPool,
}

impl PostgresSeatRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SeatAssignmentRow {
    id: Uuid,
    user_id: Uuid,
    scope_type: String,
    scope_id: Option<Uuid>,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl SeatAssignmentRow {
    fn into_assignment(self, role: &RoleRecord) -> AppResult<RoleAssignment> {
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
            role_id: role.id,
            role_name: role.name.clone(),
            scope,
            assigned_by: self.assigned_by.map(UserId::from_uuid),
            assigned_at: self.assigned_at,
            revoked_at: self.revoked_at,
        })
    }
}

#[async_trait]
impl SeatRepository for PostgresSeatRepository {
    async fn replace_holder(
        &self,
        role: &RoleRecord,
        scope: &RoleScope,
        new_user_id: UserId,
        installed_by: UserId,
    ) -> AppResult<SeatInstallation> {
        let mut transaction = begin(&self.pool).await?;

        lock_scope_entity(&mut transaction, scope).await?;

        let replaced_user = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE role_assignments
            SET revoked_at = now(), revoked_by = $4
            WHERE role_id = $1
                AND scope_type = $2
                AND scope_id IS NOT DISTINCT FROM $3
                AND revoked_at IS NULL
            RETURNING user_id
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .bind(installed_by.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke seat holder: {error}")))?
        .map(UserId::from_uuid);

        let assignment = insert_assignment(
            &mut transaction,
            role,
            scope,
            new_user_id,
            installed_by,
        )
        .await?;

        append_audit_entry(
            &mut transaction,
            AuditAction::RoleAssigned,
            assignment.id,
            installed_by,
            format!(
                "installed user '{new_user_id}' as '{}' for {scope}",
                role.name
            ),
            serde_json::json!({
                "scope_type": scope.kind().as_str(),
                "scope_id": scope.entity_id(),
                "role": role.name,
                "new_user_id": new_user_id,
                "replaced_user_id": replaced_user,
            }),
        )
        .await?;

        commit(transaction).await?;

        Ok(SeatInstallation {
            assignment,
            replaced_user,
        })
    }

    async fn vacate_holder(
        &self,
        role: &RoleRecord,
        scope: &RoleScope,
        user_id: UserId,
        vacated_by: UserId,
        baseline_role: &RoleRecord,
    ) -> AppResult<SeatVacancy> {
        let mut transaction = begin(&self.pool).await?;

        lock_scope_entity(&mut transaction, scope).await?;

        let revoked = sqlx::query_as::<_, SeatAssignmentRow>(
            r#"
            UPDATE role_assignments
            SET revoked_at = now(), revoked_by = $5
            WHERE user_id = $1
                AND role_id = $2
                AND scope_type = $3
                AND scope_id IS NOT DISTINCT FROM $4
                AND revoked_at IS NULL
            RETURNING id, user_id, scope_type, scope_id, assigned_by,
                created_at AS assigned_at, revoked_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.id.as_uuid())
        .bind(scope.kind().as_str())
        .bind(scope.entity_id())
        .bind(vacated_by.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke seat holder: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "user '{user_id}' does not hold the '{}' seat for {scope}",
                role.name
            ))
        })?
        .into_assignment(role)?;

        let mut remaining_roles = list_remaining_live(&mut transaction, user_id).await?;

        let baseline_assigned = remaining_roles.is_empty();
        if baseline_assigned {
            let baseline = insert_assignment(
                &mut transaction,
                baseline_role,
                &RoleScope::Company,
                user_id,
                vacated_by,
            )
            .await?;
            remaining_roles.push(baseline);
        }

        append_audit_entry(
            &mut transaction,
            AuditAction::RoleRevoked,
            revoked.id,
            vacated_by,
            format!("vacated user '{user_id}' from '{}' for {scope}", role.name),
            serde_json::json!({
                "scope_type": scope.kind().as_str(),
                "scope_id": scope.entity_id(),
                "role": role.name,
                "user_id": user_id,
                "baseline_assigned": baseline_assigned,
            }),
        )
        .await?;

        commit(transaction).await?;

        Ok(SeatVacancy {
            revoked,
            remaining_roles,
            baseline_assigned,
        })
    }
}

#[derive(Debug, FromRow)]
struct RemainingAssignmentRow {
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

impl RemainingAssignmentRow {
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

async fn list_remaining_live(
    transaction: &mut Transaction<'static, Postgres>,
    user_id: UserId,
) -> AppResult<Vec<RoleAssignment>> {
    let rows = sqlx::query_as::<_, RemainingAssignmentRow>(
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
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to list remaining roles: {error}")))?;

    rows.into_iter()
        .map(RemainingAssignmentRow::into_assignment)
        .collect()
}

async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
}

async fn commit(transaction: Transaction<'static, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

/// Serializes seat transactions per scope by locking the scope-entity row.
///
/// Also re-checks, inside the transaction, that the scope entity is still
/// live; a vanished entity aborts the whole operation.
async fn lock_scope_entity(
    transaction: &mut Transaction<'static, Postgres>,
    scope: &RoleScope,
) -> AppResult<()> {
    let (query, id) = match scope {
        RoleScope::Company => return Ok(()),
        RoleScope::Division(id) => (
            "SELECT id FROM divisions WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            *id,
        ),
        RoleScope::Team(id) => (
            "SELECT id FROM teams WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            *id,
        ),
        RoleScope::Project(id) => (
            "SELECT id FROM projects WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            *id,
        ),
    };

    sqlx::query_scalar::<_, Uuid>(query)
        .bind(id)
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock scope entity: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("{scope} was not found")))?;

    Ok(())
}

async fn insert_assignment(
    transaction: &mut Transaction<'static, Postgres>,
    role: &RoleRecord,
    scope: &RoleScope,
    user_id: UserId,
    assigned_by: UserId,
) -> AppResult<RoleAssignment> {
    let row = sqlx::query_as::<_, SeatAssignmentRow>(
        r#"
        INSERT INTO role_assignments (user_id, role_id, scope_type, scope_id, assigned_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, scope_type, scope_id, assigned_by,
            created_at AS assigned_at, revoked_at
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(role.id.as_uuid())
    .bind(scope.kind().as_str())
    .bind(scope.entity_id())
    .bind(assigned_by.as_uuid())
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| map_seat_conflict(error, user_id, role, scope))?;

    row.into_assignment(role)
}

async fn append_audit_entry(
    transaction: &mut Transaction<'static, Postgres>,
    action: AuditAction,
    assignment_id: Uuid,
    causer_id: UserId,
    description: String,
    properties: serde_json::Value,
) -> AppResult<()> {
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
        VALUES ('role_assignment', $1, 'user', $2, $3, $4, $5)
        "#,
    )
    .bind(assignment_id.to_string())
    .bind(causer_id.as_uuid())
    .bind(action.as_str())
    .bind(description)
    .bind(properties)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

    Ok(())
}

fn map_seat_conflict(
    error: sqlx::Error,
    user_id: UserId,
    role: &RoleRecord,
    scope: &RoleScope,
) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "user '{user_id}' already holds role '{}' in {scope}",
            role.name
        ));
    }

    AppError::Internal(format!("failed to insert seat assignment: {error}"))
}
