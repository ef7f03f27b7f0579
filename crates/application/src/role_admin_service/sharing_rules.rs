use super::*;

use warden_domain::{AuditAction, DataSharingRule, SharingRuleId};

use crate::admin_ports::CreateSharingRuleInput;
use crate::authorization_ports::AuditEvent;

impl RoleAdminService {
    /// Creates an active data sharing rule and emits an audit event.
    ///
    /// Conditions are validated at creation time so operator/value shape
    /// defects surface here instead of silently never matching.
    pub async fn create_sharing_rule(
        &self,
        actor: &UserIdentity,
        input: CreateSharingRuleInput,
    ) -> AppResult<DataSharingRule> {
        self.require_role_manage(actor).await?;
        let tenant_id = actor.tenant_id();

        if input.actions.is_empty() {
            return Err(AppError::Validation(
                "sharing rule must name at least one action".to_owned(),
            ));
        }

        for condition in &input.conditions {
            condition.validate()?;
        }

        let rule = DataSharingRule {
            rule_id: SharingRuleId::new(),
            entity: input.entity,
            actions: input.actions,
            is_active: true,
            share_with: input.share_with,
            conditions: input.conditions,
        };

        self.repository
            .insert_sharing_rule(tenant_id, rule.clone())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id: actor.user_id(),
                action: AuditAction::SharingRuleCreated,
                resource_type: "data_sharing_rule".to_owned(),
                resource_id: rule.rule_id.to_string(),
                detail: Some(format!(
                    "created sharing rule for entity '{}' with {} condition(s)",
                    rule.entity,
                    rule.conditions.len()
                )),
            })
            .await?;

        Ok(rule)
    }
}
