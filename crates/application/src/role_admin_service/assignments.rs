use super::*;

use chrono::Utc;
use warden_core::UserId;
use warden_domain::{AuditAction, RoleAssignment, RoleId};

use crate::admin_ports::AssignRoleInput;
use crate::authorization_ports::AuditEvent;

impl RoleAdminService {
    /// Grants a role to a user within an optional validity window and emits
    /// an audit event.
    pub async fn assign_role(&self, actor: &UserIdentity, input: AssignRoleInput) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        self.find_existing_role(tenant_id, input.role_id).await?;

        let starts_at = input.starts_at.unwrap_or_else(Utc::now);
        if let Some(expires_at) = input.expires_at
            && expires_at <= starts_at
        {
            return Err(AppError::Validation(format!(
                "assignment expiry '{expires_at}' must be after start '{starts_at}'"
            )));
        }

        self.repository
            .insert_assignment(
                tenant_id,
                RoleAssignment {
                    user_id: input.user_id,
                    role_id: input.role_id,
                    starts_at,
                    expires_at: input.expires_at,
                },
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: AuditAction::RoleAssigned,
                resource_type: "authz_role_assignment".to_owned(),
                resource_id: format!("{}:{}", input.user_id, input.role_id),
                detail: Some(format!(
                    "assigned role '{}' to user '{}'",
                    input.role_id, input.user_id
                )),
            })
            .await
    }

    /// Revokes a role from a user by expiring its open assignments now.
    /// Rows are retained for history.
    pub async fn revoke_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        let expired = self
            .repository
            .expire_assignments(tenant_id, user_id, role_id, Utc::now())
            .await?;
        if expired == 0 {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' has no active assignment of role '{role_id}'"
            )));
        }

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: AuditAction::RoleRevoked,
                resource_type: "authz_role_assignment".to_owned(),
                resource_id: format!("{user_id}:{role_id}"),
                detail: Some(format!(
                    "revoked role '{role_id}' from user '{user_id}' ({expired} assignment(s) expired)"
                )),
            })
            .await
    }
}
