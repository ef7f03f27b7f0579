use std::sync::Arc;

use warden_core::{AppError, AppResult, UserIdentity};
use warden_domain::{EntityType, RecordAction};

use crate::AuthorizationService;
use crate::admin_ports::RoleAdminRepository;
use crate::authorization_ports::AuditRepository;

mod assignments;
mod roles;
mod seed;
mod sharing_rules;


pub use seed::baseline_role_seed_set;

/// Application service for role, assignment, and sharing-rule administration.
///
/// Administrative operations are gated through the engine itself: the actor
/// needs VIEW or EDIT on the `roles` entity.
#[derive(Clone)]
pub struct RoleAdminService {
    repository: Arc<dyn RoleAdminRepository>,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleAdminRepository>,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            audit_repository,
        }
    }

    async fn require_role_action(
        &self,
        actor: &UserIdentity,
        action: RecordAction,
    ) -> AppResult<()> {
        let decision = self
            .authorization_service
            .check_permission(
                actor.tenant_id(),
                actor.user_id(),
                EntityType::Roles,
                action,
                None,
                None,
            )
            .await?;

        if decision.allowed {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' may not {action} roles in tenant '{}': {}",
            actor.user_id(),
            actor.tenant_id(),
            decision.reason.unwrap_or_default()
        )))
    }

    async fn require_role_manage(&self, actor: &UserIdentity) -> AppResult<()> {
        self.require_role_action(actor, RecordAction::Edit).await
    }

    async fn require_role_view(&self, actor: &UserIdentity) -> AppResult<()> {
        self.require_role_action(actor, RecordAction::View).await
    }
}
