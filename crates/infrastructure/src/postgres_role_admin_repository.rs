use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use warden_application::RoleAdminRepository;
use warden_core::{AppError, AppResult, TenantId, UserId};
use warden_domain::{DataSharingRule, FieldPermission, Role, RoleAssignment, RoleId, RolePermission};

use crate::postgres_authorization_repository::RoleRow;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed write store for role administration.
#[derive(Clone)]
pub struct PostgresRoleAdminRepository {
    pool: PgPool,
}

impl PostgresRoleAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROLE_COLUMNS: &str = "id, name, display_name, level, role_type, is_active, parent_role_id";

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}

#[derive(Debug, FromRow)]
struct ExpiredCount {
    expired: i64,
}

#[async_trait]
impl RoleAdminRepository for PostgresRoleAdminRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM authz_roles
            WHERE tenant_id = $1
            ORDER BY name
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(|row| row.into_role(tenant_id)).collect()
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM authz_roles
            WHERE tenant_id = $1
                AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(|row| row.into_role(tenant_id)).transpose()
    }

    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM authz_roles
            WHERE tenant_id = $1
                AND name = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role by name: {error}")))?;

        row.map(|row| row.into_role(tenant_id)).transpose()
    }

    async fn insert_role(
        &self,
        tenant_id: TenantId,
        role: Role,
        permissions: Vec<RolePermission>,
        field_permissions: Vec<FieldPermission>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO authz_roles
                (tenant_id, id, name, display_name, level, role_type, is_active, parent_role_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.role_id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.display_name().as_str())
        .bind(role.level())
        .bind(role.role_type().as_str())
        .bind(role.is_active())
        .bind(role.parent_role_id().map(|parent| parent.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, role.name().as_str()))?;

        for statement in &permissions {
            sqlx::query(
                r#"
                INSERT INTO authz_role_permissions (tenant_id, role_id, entity, action, tier)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tenant_id, role_id, entity, action) DO UPDATE SET tier = $5
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(statement.role_id.as_uuid())
            .bind(statement.entity.as_str())
            .bind(statement.action.as_str())
            .bind(statement.tier.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role statements: {error}"))
            })?;
        }

        for statement in &field_permissions {
            sqlx::query(
                r#"
                INSERT INTO authz_field_permissions
                    (tenant_id, role_id, entity, field_name,
                     can_view, can_edit, mask_value, mask_pattern)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(statement.role_id.as_uuid())
            .bind(statement.entity.as_str())
            .bind(statement.field_name.as_str())
            .bind(statement.can_view)
            .bind(statement.can_edit)
            .bind(statement.mask_value)
            .bind(statement.mask_pattern.as_deref())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist field statements: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn set_role_parent(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE authz_roles
            SET parent_role_id = $3
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(parent_role_id.map(|parent| parent.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role parent: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        }

        Ok(())
    }

    async fn set_role_active(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        is_active: bool,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE authz_roles
            SET is_active = $3
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role state: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        }

        Ok(())
    }

    async fn insert_assignment(
        &self,
        tenant_id: TenantId,
        assignment: RoleAssignment,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO authz_role_assignments (tenant_id, user_id, role_id, starts_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.starts_at)
        .bind(assignment.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist assignment: {error}")))?;

        Ok(())
    }

    async fn expire_assignments(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<usize> {
        let row = sqlx::query_as::<_, ExpiredCount>(
            r#"
            WITH expired AS (
                UPDATE authz_role_assignments
                SET expires_at = $4
                WHERE tenant_id = $1
                    AND user_id = $2
                    AND role_id = $3
                    AND (expires_at IS NULL OR expires_at > $4)
                RETURNING 1
            )
            SELECT COUNT(*) AS expired FROM expired
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expire assignments: {error}")))?;

        Ok(usize::try_from(row.expired).unwrap_or_default())
    }

    async fn insert_sharing_rule(
        &self,
        tenant_id: TenantId,
        rule: DataSharingRule,
    ) -> AppResult<()> {
        let actions = serde_json::to_string(&rule.actions).map_err(|error| {
            AppError::Internal(format!("failed to encode sharing rule actions: {error}"))
        })?;
        let share_with = serde_json::to_string(&rule.share_with).map_err(|error| {
            AppError::Internal(format!("failed to encode sharing rule audience: {error}"))
        })?;
        let conditions = serde_json::to_string(&rule.conditions).map_err(|error| {
            AppError::Internal(format!("failed to encode sharing rule conditions: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO authz_sharing_rules
                (tenant_id, id, entity, actions, is_active, share_with, conditions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(rule.rule_id.as_uuid())
        .bind(rule.entity.as_str())
        .bind(actions)
        .bind(rule.is_active)
        .bind(share_with)
        .bind(conditions)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist sharing rule: {error}")))?;

        Ok(())
    }
}
