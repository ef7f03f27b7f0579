use super::*;

use std::collections::HashSet;

use warden_core::TenantId;
use warden_domain::{AuditAction, FieldPermission, Role, RoleId, RolePermission, RoleType};

use crate::admin_ports::CreateRoleInput;
use crate::authorization_ports::AuditEvent;

impl RoleAdminService {
    /// Returns tenant roles for administrative users.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        self.require_role_view(actor).await?;
        self.repository.list_roles(actor.tenant_id()).await
    }

    /// Creates a custom role with its statements and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        if self
            .repository
            .find_role_by_name(tenant_id, input.name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists in tenant '{tenant_id}'",
                input.name
            )));
        }

        if let Some(parent_id) = input.parent_role_id {
            self.ensure_parent_chain_is_acyclic(tenant_id, None, parent_id)
                .await?;
        }

        let role = Role::new(
            RoleId::new(),
            input.name,
            input.display_name,
            input.level,
            RoleType::Custom,
            input.parent_role_id,
        )?;

        let permissions: Vec<RolePermission> = input
            .permissions
            .iter()
            .map(|statement| RolePermission {
                role_id: role.role_id(),
                entity: statement.entity,
                action: statement.action,
                tier: statement.tier,
            })
            .collect();
        let field_permissions: Vec<FieldPermission> = input
            .field_permissions
            .into_iter()
            .map(|statement| FieldPermission {
                role_id: role.role_id(),
                entity: statement.entity,
                field_name: statement.field_name,
                can_view: statement.can_view,
                can_edit: statement.can_edit,
                mask_value: statement.mask_value,
                mask_pattern: statement.mask_pattern,
            })
            .collect();

        self.repository
            .insert_role(tenant_id, role.clone(), permissions, field_permissions)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: AuditAction::RoleCreated,
                resource_type: "authz_role".to_owned(),
                resource_id: role.role_id().to_string(),
                detail: Some(format!("created role '{}'", role.name())),
            })
            .await?;

        Ok(role)
    }

    /// Replaces a role's parent reference after validating the chain stays
    /// acyclic, and emits an audit event.
    pub async fn set_role_parent(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        let role = self.find_existing_role(tenant_id, role_id).await?;

        if let Some(parent_id) = parent_role_id {
            if parent_id == role_id {
                return Err(AppError::Validation(format!(
                    "role '{}' cannot be its own parent",
                    role.name()
                )));
            }

            self.ensure_parent_chain_is_acyclic(tenant_id, Some(role_id), parent_id)
                .await?;
        }

        self.repository
            .set_role_parent(tenant_id, role_id, parent_role_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: AuditAction::RoleParentChanged,
                resource_type: "authz_role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(match parent_role_id {
                    Some(parent_id) => {
                        format!("set parent of role '{}' to '{parent_id}'", role.name())
                    }
                    None => format!("cleared parent of role '{}'", role.name()),
                }),
            })
            .await
    }

    /// Deactivates a role so it stops contributing permissions on the next
    /// resolution. History is preserved; nothing is deleted.
    pub async fn deactivate_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        self.set_role_active(actor, role_id, false, AuditAction::RoleDeactivated)
            .await
    }

    /// Reactivates a previously deactivated role.
    pub async fn reactivate_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        self.set_role_active(actor, role_id, true, AuditAction::RoleReactivated)
            .await
    }

    async fn set_role_active(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        is_active: bool,
        audit_action: AuditAction,
    ) -> AppResult<()> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        let role = self.find_existing_role(tenant_id, role_id).await?;

        self.repository
            .set_role_active(tenant_id, role_id, is_active)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: audit_action,
                resource_type: "authz_role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!(
                    "set role '{}' active flag to {is_active}",
                    role.name()
                )),
            })
            .await
    }

    pub(super) async fn find_existing_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Role> {
        self.repository
            .find_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role_id}' does not exist in tenant '{tenant_id}'"
                ))
            })
    }

    /// Walks the chain starting at the proposed parent and rejects any path
    /// that reaches `edited_role` or revisits a role.
    async fn ensure_parent_chain_is_acyclic(
        &self,
        tenant_id: TenantId,
        edited_role: Option<RoleId>,
        parent_id: RoleId,
    ) -> AppResult<()> {
        let mut visited = HashSet::new();
        let mut current = Some(parent_id);

        while let Some(role_id) = current {
            if edited_role == Some(role_id) {
                return Err(AppError::Validation(format!(
                    "parent chain would create a cycle through role '{role_id}'"
                )));
            }

            if !visited.insert(role_id) {
                return Err(AppError::Validation(format!(
                    "parent chain already contains a cycle at role '{role_id}'"
                )));
            }

            current = self
                .repository
                .find_role(tenant_id, role_id)
                .await?
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "parent chain references missing role '{role_id}' in tenant '{tenant_id}'"
                    ))
                })?
                .parent_role_id();
        }

        Ok(())
    }
}
