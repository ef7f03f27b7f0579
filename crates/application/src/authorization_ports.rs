use async_trait::async_trait;
use warden_core::{AppResult, TenantId, UserId};
use warden_domain::{
    AuditAction, DataSharingRule, EntityType, FieldPermission, Role, RoleAssignment, RoleId,
    RolePermission, TeamId,
};

/// Repository port for the read side of permission resolution.
///
/// Every method is tenant-scoped and returns a hard error when the backing
/// store fails; the engine never substitutes an empty result for a failed
/// read, because an empty set silently denies instead of surfacing the
/// outage.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists every role assignment for a user, including expired rows.
    async fn list_assignments_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Finds one role definition by identifier.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists the entity permission statements attached to a role.
    async fn list_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<RolePermission>>;

    /// Lists the field governance statements attached to a role.
    async fn list_field_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<FieldPermission>>;
}

/// Port for fresh team membership lookups.
///
/// Team membership changes independently of role assignment, so the TEAM
/// tier and the sharing evaluator look it up per call instead of caching it
/// in the effective set.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Returns the user's current team, if they belong to one.
    async fn current_team_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamId>>;
}

/// Port for reading the active data sharing rules of one entity.
#[async_trait]
pub trait SharingRuleRepository: Send + Sync {
    /// Lists active rules for the entity.
    async fn list_active_rules(
        &self,
        tenant_id: TenantId,
        entity: EntityType,
    ) -> AppResult<Vec<DataSharingRule>>;
}

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// User that performed or benefited from the action.
    pub user_id: UserId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
