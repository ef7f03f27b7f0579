use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_core::{AppResult, TenantId, UserId};
use warden_domain::{
    AccessTier, DataSharingRule, EntityType, FieldPermission, RecordAction, Role, RoleAssignment,
    RoleId, RolePermission, ShareCondition, ShareTarget,
};

/// One entity permission statement in a role creation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePermissionInput {
    /// Governed entity type.
    pub entity: EntityType,
    /// Granted action.
    pub action: RecordAction,
    /// Record-access tier for the action.
    pub tier: AccessTier,
}

/// One field governance statement in a role creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPermissionInput {
    /// Governed entity type.
    pub entity: EntityType,
    /// Governed field name.
    pub field_name: String,
    /// Whether the field may be returned to the user.
    pub can_view: bool,
    /// Whether the field may be written by the user.
    pub can_edit: bool,
    /// Whether the field value must be masked before display.
    pub mask_value: bool,
    /// Optional mask pattern.
    pub mask_pattern: Option<String>,
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Display (human-friendly) name.
    pub display_name: String,
    /// Seniority level for display and sorting.
    pub level: i32,
    /// Optional parent role in the inheritance chain.
    pub parent_role_id: Option<RoleId>,
    /// Entity permission statements to attach.
    pub permissions: Vec<RolePermissionInput>,
    /// Field governance statements to attach.
    pub field_permissions: Vec<FieldPermissionInput>,
}

/// Input payload for granting a role to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Start of the validity window; defaults to now when unset.
    pub starts_at: Option<DateTime<Utc>>,
    /// End of the validity window; unset means never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input payload for creating a data sharing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSharingRuleInput {
    /// Entity the rule applies to.
    pub entity: EntityType,
    /// Actions the rule can unlock.
    pub actions: Vec<RecordAction>,
    /// Audience the rule grants access to.
    pub share_with: ShareTarget,
    /// Conditions that must all match; empty grants unconditionally.
    pub conditions: Vec<ShareCondition>,
}

/// One role definition in a seed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSeed {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Display (human-friendly) name.
    pub display_name: String,
    /// Seniority level for display and sorting.
    pub level: i32,
    /// Entity permission statements to attach.
    pub permissions: Vec<RolePermissionInput>,
    /// Field governance statements to attach.
    pub field_permissions: Vec<FieldPermissionInput>,
}

/// Versioned, explicit seed payload for the bootstrap routine.
///
/// Seeding is idempotent by role name and safe to re-run; nothing is seeded
/// implicitly at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSeedSet {
    /// Seed data revision, recorded for diagnostics.
    pub version: u32,
    /// Roles to install.
    pub roles: Vec<RoleSeed>,
}

/// Outcome of one seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Names of roles installed by this run.
    pub created: Vec<String>,
    /// Names of roles that already existed and were left untouched.
    pub skipped: Vec<String>,
}

/// Repository port for role and sharing-rule administration.
#[async_trait]
pub trait RoleAdminRepository: Send + Sync {
    /// Lists all tenant roles.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Finds one role definition by identifier.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds one role definition by unique name.
    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str)
    -> AppResult<Option<Role>>;

    /// Persists a role together with its permission statements.
    async fn insert_role(
        &self,
        tenant_id: TenantId,
        role: Role,
        permissions: Vec<RolePermission>,
        field_permissions: Vec<FieldPermission>,
    ) -> AppResult<()>;

    /// Replaces a role's parent reference.
    async fn set_role_parent(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()>;

    /// Flips a role's active flag.
    async fn set_role_active(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        is_active: bool,
    ) -> AppResult<()>;

    /// Persists a role assignment row.
    async fn insert_assignment(
        &self,
        tenant_id: TenantId,
        assignment: RoleAssignment,
    ) -> AppResult<()>;

    /// Expires every open assignment of a role for a user. Returns the
    /// number of rows expired; rows are never deleted.
    async fn expire_assignments(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<usize>;

    /// Persists a data sharing rule.
    async fn insert_sharing_rule(
        &self,
        tenant_id: TenantId,
        rule: DataSharingRule,
    ) -> AppResult<()>;
}
