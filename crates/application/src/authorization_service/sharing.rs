use super::*;

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use warden_domain::{AuditAction, RoleId, SharingRuleId};

use crate::authorization_ports::AuditEvent;

impl AuthorizationService {
    /// Returns whether any active sharing rule unlocks the action for the
    /// candidate record.
    ///
    /// Targeting uses the user's raw currently-valid assignment rows (the
    /// hierarchy is not expanded) and a fresh team lookup. A `false` result
    /// means "no additional grant"; it never overrides an existing allow.
    pub async fn check_data_sharing_rules(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
        action: RecordAction,
        record: &Value,
    ) -> AppResult<bool> {
        Ok(self
            .first_granting_rule(tenant_id, user_id, entity, action, record)
            .await?
            .is_some())
    }

    /// Combined record check: the role system first, sharing rules as a
    /// secondary grant path when it denies and a record is available.
    ///
    /// A sharing grant produces an allowed decision with no tier and appends
    /// an audit event naming the granting rule.
    pub async fn check_record_access(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
        action: RecordAction,
        record_owner: Option<UserId>,
        record_team: Option<TeamId>,
        record: Option<&Value>,
    ) -> AppResult<AccessDecision> {
        let decision = self
            .check_permission(tenant_id, user_id, entity, action, record_owner, record_team)
            .await?;
        if decision.allowed {
            return Ok(decision);
        }

        let Some(record) = record else {
            return Ok(decision);
        };

        let Some(rule_id) = self
            .first_granting_rule(tenant_id, user_id, entity, action, record)
            .await?
        else {
            return Ok(decision);
        };

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id,
                user_id,
                action: AuditAction::SharingGrantUsed,
                resource_type: "data_sharing_rule".to_owned(),
                resource_id: rule_id.to_string(),
                detail: Some(format!(
                    "sharing rule '{rule_id}' granted {action} on {entity} after role denial"
                )),
            })
            .await?;

        Ok(AccessDecision::allow_supplemental())
    }

    async fn first_granting_rule(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
        action: RecordAction,
        record: &Value,
    ) -> AppResult<Option<SharingRuleId>> {
        let now = Utc::now();
        let assignments = self
            .repository
            .list_assignments_for_user(tenant_id, user_id)
            .await?;
        let role_ids: HashSet<RoleId> = assignments
            .iter()
            .filter(|assignment| assignment.is_active_at(now))
            .map(|assignment| assignment.role_id)
            .collect();

        let team_id = self
            .team_directory
            .current_team_for_user(tenant_id, user_id)
            .await?;

        let rules = self.sharing_rules.list_active_rules(tenant_id, entity).await?;
        for rule in rules {
            if !rule.share_with.matches(user_id, team_id, &role_ids) {
                continue;
            }

            if rule.grants(action, record) {
                return Ok(Some(rule.rule_id));
            }
        }

        Ok(None)
    }
}
