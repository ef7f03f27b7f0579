use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use warden_application::{AuthorizationRepository, SharingRuleRepository, TeamDirectory};
use warden_core::{AppError, AppResult, TenantId, UserId};
use warden_domain::{
    AccessTier, DataSharingRule, EntityType, FieldPermission, RecordAction, Role, RoleAssignment,
    RoleId, RolePermission, RoleType, ShareCondition, ShareTarget, SharingRuleId, TeamId,
};

/// PostgreSQL-backed read store for permission resolution.
///
/// Serves the assignment, role, statement, team, and sharing-rule lookups the
/// resolver performs; all writes go through
/// [`crate::PostgresRoleAdminRepository`].
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    starts_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
pub(crate) struct RoleRow {
    pub(crate) id: uuid::Uuid,
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) level: i32,
    pub(crate) role_type: String,
    pub(crate) is_active: bool,
    pub(crate) parent_role_id: Option<uuid::Uuid>,
}

impl RoleRow {
    pub(crate) fn into_role(self, tenant_id: TenantId) -> AppResult<Role> {
        let role_type = RoleType::from_str(self.role_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role type '{}' for tenant '{tenant_id}': {error}",
                self.role_type
            ))
        })?;
        let role = Role::new(
            RoleId::from_uuid(self.id),
            self.name,
            self.display_name,
            self.level,
            role_type,
            self.parent_role_id.map(RoleId::from_uuid),
        )
        .map_err(|error| {
            AppError::Internal(format!(
                "stored role '{}' is invalid for tenant '{tenant_id}': {error}",
                self.id
            ))
        })?;
        Ok(role.with_active(self.is_active))
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    role_id: uuid::Uuid,
    entity: String,
    action: String,
    tier: String,
}

#[derive(Debug, FromRow)]
struct FieldPermissionRow {
    role_id: uuid::Uuid,
    entity: String,
    field_name: String,
    can_view: bool,
    can_edit: bool,
    mask_value: bool,
    mask_pattern: Option<String>,
}

#[derive(Debug, FromRow)]
struct SharingRuleRow {
    id: uuid::Uuid,
    entity: String,
    actions: String,
    is_active: bool,
    share_with: String,
    conditions: String,
}

fn decode_entity(value: &str, tenant_id: TenantId) -> AppResult<EntityType> {
    EntityType::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode entity '{value}' for tenant '{tenant_id}': {error}"
        ))
    })
}

fn decode_action(value: &str, tenant_id: TenantId) -> AppResult<RecordAction> {
    RecordAction::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode action '{value}' for tenant '{tenant_id}': {error}"
        ))
    })
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_assignments_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, role_id, starts_at, expires_at
            FROM authz_role_assignments
            WHERE tenant_id = $1
                AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignment {
                user_id: UserId::from_uuid(row.user_id),
                role_id: RoleId::from_uuid(row.role_id),
                starts_at: row.starts_at,
                expires_at: row.expires_at,
            })
            .collect())
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, display_name, level, role_type, is_active, parent_role_id
            FROM authz_roles
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(|row| row.into_role(tenant_id)).transpose()
    }

    async fn list_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<RolePermission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT role_id, entity, action, tier
            FROM authz_role_permissions
            WHERE tenant_id = $1
                AND role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role statements: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let tier = AccessTier::from_str(row.tier.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode tier '{}' for tenant '{tenant_id}': {error}",
                        row.tier
                    ))
                })?;
                Ok(RolePermission {
                    role_id: RoleId::from_uuid(row.role_id),
                    entity: decode_entity(row.entity.as_str(), tenant_id)?,
                    action: decode_action(row.action.as_str(), tenant_id)?,
                    tier,
                })
            })
            .collect()
    }

    async fn list_field_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<FieldPermission>> {
        let rows = sqlx::query_as::<_, FieldPermissionRow>(
            r#"
            SELECT role_id, entity, field_name, can_view, can_edit, mask_value, mask_pattern
            FROM authz_field_permissions
            WHERE tenant_id = $1
                AND role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list field statements: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(FieldPermission {
                    role_id: RoleId::from_uuid(row.role_id),
                    entity: decode_entity(row.entity.as_str(), tenant_id)?,
                    field_name: row.field_name,
                    can_view: row.can_view,
                    can_edit: row.can_edit,
                    mask_value: row.mask_value,
                    mask_pattern: row.mask_pattern,
                })
            })
            .collect()
    }
}

#[async_trait]
impl TeamDirectory for PostgresAuthorizationRepository {
    async fn current_team_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamId>> {
        let team_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT team_id
            FROM authz_team_members
            WHERE tenant_id = $1
                AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load team membership: {error}")))?;

        Ok(team_id.map(TeamId::from_uuid))
    }
}

#[async_trait]
impl SharingRuleRepository for PostgresAuthorizationRepository {
    async fn list_active_rules(
        &self,
        tenant_id: TenantId,
        entity: EntityType,
    ) -> AppResult<Vec<DataSharingRule>> {
        let rows = sqlx::query_as::<_, SharingRuleRow>(
            r#"
            SELECT id, entity, actions, is_active, share_with, conditions
            FROM authz_sharing_rules
            WHERE tenant_id = $1
                AND entity = $2
                AND is_active = TRUE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(entity.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list sharing rules: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let actions: Vec<RecordAction> =
                    serde_json::from_str(row.actions.as_str()).map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode actions of sharing rule '{}': {error}",
                            row.id
                        ))
                    })?;
                let share_with: ShareTarget = serde_json::from_str(row.share_with.as_str())
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode audience of sharing rule '{}': {error}",
                            row.id
                        ))
                    })?;
                let conditions: Vec<ShareCondition> =
                    serde_json::from_str(row.conditions.as_str()).map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode conditions of sharing rule '{}': {error}",
                            row.id
                        ))
                    })?;
                Ok(DataSharingRule {
                    rule_id: SharingRuleId::from_uuid(row.id),
                    entity: decode_entity(row.entity.as_str(), tenant_id)?,
                    actions,
                    is_active: row.is_active,
                    share_with,
                    conditions,
                })
            })
            .collect()
    }
}
