use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use warden_application::{AuthorizationRepository, RoleAdminRepository};
use warden_core::{TenantId, UserId};
use warden_domain::{
    AccessTier, EntityType, RecordAction, Role, RoleAssignment, RoleId, RolePermission, RoleType,
};

use super::PostgresRoleAdminRepository;
use crate::PostgresAuthorizationRepository;

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
        panic!("failed to run migrations for role admin tests: {error}");
    }

    Some(pool)
}

fn sample_role(name: &str) -> Role {
    match Role::new(RoleId::new(), name, name, 10, RoleType::Custom, None) {
        Ok(role) => role,
        Err(error) => panic!("sample role must be valid: {error}"),
    }
}

#[tokio::test]
async fn insert_role_round_trips_through_the_read_store() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresRoleAdminRepository::new(pool.clone());
    let reader = PostgresAuthorizationRepository::new(pool);
    let tenant_id = TenantId::new();

    let role = sample_role("support");
    let role_id = role.role_id();
    let statements = vec![RolePermission {
        role_id,
        entity: EntityType::Contacts,
        action: RecordAction::View,
        tier: AccessTier::Team,
    }];
    let inserted = admin
        .insert_role(tenant_id, role, statements, Vec::new())
        .await;
    assert!(inserted.is_ok());

    let loaded = reader.find_role(tenant_id, role_id).await;
    match loaded {
        Ok(Some(role)) => {
            assert_eq!(role.name().as_str(), "support");
            assert!(role.is_active());
        }
        Ok(None) => panic!("inserted role must be readable"),
        Err(error) => panic!("lookup must succeed: {error}"),
    }

    let statements = reader.list_role_permissions(tenant_id, role_id).await;
    match statements {
        Ok(statements) => {
            assert_eq!(statements.len(), 1);
            assert_eq!(statements[0].tier, AccessTier::Team);
        }
        Err(error) => panic!("statement lookup must succeed: {error}"),
    }

    // Another tenant sees nothing.
    let foreign = reader.find_role(TenantId::new(), role_id).await;
    assert!(foreign.is_ok_and(|role| role.is_none()));
}

#[tokio::test]
async fn duplicate_role_names_conflict_within_a_tenant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresRoleAdminRepository::new(pool);
    let tenant_id = TenantId::new();

    let first = admin
        .insert_role(tenant_id, sample_role("billing"), Vec::new(), Vec::new())
        .await;
    assert!(first.is_ok());

    let second = admin
        .insert_role(tenant_id, sample_role("billing"), Vec::new(), Vec::new())
        .await;
    assert!(matches!(second, Err(warden_core::AppError::Conflict(_))));

    // The same name is free in a different tenant.
    let other_tenant = admin
        .insert_role(TenantId::new(), sample_role("billing"), Vec::new(), Vec::new())
        .await;
    assert!(other_tenant.is_ok());
}

#[tokio::test]
async fn expire_assignments_counts_only_open_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresRoleAdminRepository::new(pool);
    let tenant_id = TenantId::new();
    let user_id = UserId::new();

    let role = sample_role("temp_access");
    let role_id = role.role_id();
    let inserted_role = admin.insert_role(tenant_id, role, Vec::new(), Vec::new()).await;
    assert!(inserted_role.is_ok());

    let open = admin
        .insert_assignment(
            tenant_id,
            RoleAssignment {
                user_id,
                role_id,
                starts_at: Utc::now() - Duration::days(1),
                expires_at: None,
            },
        )
        .await;
    assert!(open.is_ok());
    let already_expired = admin
        .insert_assignment(
            tenant_id,
            RoleAssignment {
                user_id,
                role_id,
                starts_at: Utc::now() - Duration::days(30),
                expires_at: Some(Utc::now() - Duration::days(20)),
            },
        )
        .await;
    assert!(already_expired.is_ok());

    let expired = admin
        .expire_assignments(tenant_id, user_id, role_id, Utc::now())
        .await;
    assert!(expired.is_ok_and(|count| count == 1));

    let repeat = admin
        .expire_assignments(tenant_id, user_id, role_id, Utc::now())
        .await;
    assert!(repeat.is_ok_and(|count| count == 0));
}
