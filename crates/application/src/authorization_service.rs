use std::sync::Arc;

use warden_core::{AppResult, TenantId, UserId};
use warden_domain::{AccessDecision, EffectivePermissionSet, EntityType, RecordAction, TeamId};

use crate::authorization_ports::{
    AuditRepository, AuthorizationRepository, SharingRuleRepository, TeamDirectory,
};

mod field_access;
mod record_access;
mod resolver;
mod sharing;


/// Application service for tenant-scoped permission resolution.
///
/// Every call recomputes its inputs from the backing store; the service holds
/// no mutable state, so concurrent checks for different users or entities
/// need no coordination.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    team_directory: Arc<dyn TeamDirectory>,
    sharing_rules: Arc<dyn SharingRuleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from port implementations.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        team_directory: Arc<dyn TeamDirectory>,
        sharing_rules: Arc<dyn SharingRuleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            team_directory,
            sharing_rules,
            audit_repository,
        }
    }

    /// Checks one (entity, action) pair against a freshly resolved set.
    ///
    /// `record_owner` and `record_team` supply record context for the OWN and
    /// TEAM tiers; pass `None` for both when checking a non-record action
    /// such as CREATE.
    pub async fn check_permission(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
        action: RecordAction,
        record_owner: Option<UserId>,
        record_team: Option<TeamId>,
    ) -> AppResult<AccessDecision> {
        let set = self.resolve(tenant_id, user_id).await?;
        self.check_permission_with_set(
            tenant_id,
            user_id,
            &set,
            entity,
            action,
            record_owner,
            record_team,
        )
        .await
    }

    /// Resolves the user's effective permission set once for reuse.
    ///
    /// Request handlers that check several records in one request should
    /// resolve once and feed the set to
    /// [`Self::check_permission_with_set`] to avoid redundant aggregation.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<EffectivePermissionSet> {
        self.resolve_effective_set(tenant_id, user_id).await
    }
}
