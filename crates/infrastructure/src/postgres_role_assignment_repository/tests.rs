use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crewdesk_application::{NewAssignment, RoleAssignmentRepository};
use crewdesk_core::{AppError, UserId};
use crewdesk_domain::{RoleId, RoleScope};

use super::PostgresRoleAssignmentRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for assignment repository tests: {error}");
    }

    Some(pool)
}

async fn ensure_user(pool: &PgPool, user_id: UserId, display_name: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO users (id, display_name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(user_id.as_uuid())
    .bind(display_name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn seeded_role(pool: &PgPool, name: &str) -> RoleId {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
            SELECT id FROM roles
            WHERE name = $1 AND deleted_at IS NULL
            "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await;

    match id {
        Ok(id) => RoleId::from_uuid(id),
        Err(error) => panic!("seeded role '{name}' is missing: {error}"),
    }
}

#[tokio::test]
async fn insert_list_revoke_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleAssignmentRepository::new(pool.clone());
    let user_id = UserId::new();
    let actor = UserId::new();
    ensure_user(&pool, user_id, "Round Trip User").await;
    ensure_user(&pool, actor, "Round Trip Actor").await;
    let role_id = seeded_role(&pool, "employee").await;

    let inserted = repository
        .insert(NewAssignment {
            user_id,
            role_id,
            role_name: "employee".to_owned(),
            scope: RoleScope::Company,
            assigned_by: actor,
        })
        .await;
    assert!(inserted.is_ok());

    let listed = repository.list_live_by_user(user_id).await;
    assert!(listed.is_ok_and(|rows| {
        rows.len() == 1 && rows[0].role_name == "employee" && rows[0].is_live()
    }));

    let revoked = repository
        .revoke(user_id, role_id, &RoleScope::Company, actor)
        .await;
    assert!(revoked.is_ok_and(|row| row.revoked_at.is_some()));

    let after = repository.list_live_by_user(user_id).await;
    assert!(after.as_ref().is_ok_and(Vec::is_empty));
}

#[tokio::test]
async fn duplicate_live_insert_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleAssignmentRepository::new(pool.clone());
    let user_id = UserId::new();
    let actor = UserId::new();
    ensure_user(&pool, user_id, "Duplicate User").await;
    ensure_user(&pool, actor, "Duplicate Actor").await;
    let role_id = seeded_role(&pool, "hr_manager").await;

    let assignment = NewAssignment {
        user_id,
        role_id,
        role_name: "hr_manager".to_owned(),
        scope: RoleScope::Company,
        assigned_by: actor,
    };

    let first = repository.insert(assignment.clone()).await;
    assert!(first.is_ok());

    let second = repository.insert(assignment).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn revoke_without_live_assignment_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleAssignmentRepository::new(pool.clone());
    let user_id = UserId::new();
    ensure_user(&pool, user_id, "No Assignment User").await;
    let role_id = seeded_role(&pool, "employee").await;

    let result = repository
        .revoke(user_id, role_id, &RoleScope::Company, user_id)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
