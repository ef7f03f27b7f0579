use super::*;

use warden_domain::AccessTier;

pub(super) const NO_ROLES_REASON: &str = "no roles assigned";
pub(super) const TIER_NONE_REASON: &str = "record access denied";
pub(super) const OWN_ONLY_REASON: &str = "can only access own records";
pub(super) const TEAM_ONLY_REASON: &str = "can only access own or team records";

impl AuthorizationService {
    /// Evaluates record access against a previously resolved set.
    ///
    /// The only extra lookup is the user's current team, taken freshly and
    /// only on the TEAM branch.
    pub async fn check_permission_with_set(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        set: &EffectivePermissionSet,
        entity: EntityType,
        action: RecordAction,
        record_owner: Option<UserId>,
        record_team: Option<TeamId>,
    ) -> AppResult<AccessDecision> {
        if set.is_empty() {
            return Ok(AccessDecision::deny(NO_ROLES_REASON));
        }

        if !set.has_entity_permissions(entity) {
            return Ok(AccessDecision::deny(format!(
                "no permissions for entity: {entity}"
            )));
        }

        let Some(tier) = set.tier(entity, action) else {
            return Ok(AccessDecision::deny(format!(
                "no {action} permission for entity: {entity}"
            )));
        };

        match tier {
            AccessTier::None => Ok(AccessDecision::deny(TIER_NONE_REASON)),
            AccessTier::All => Ok(AccessDecision::allow(tier)),
            AccessTier::Own => {
                // Ownerless records are unrestricted.
                if record_owner.is_none_or(|owner| owner == user_id) {
                    Ok(AccessDecision::allow(tier))
                } else {
                    Ok(AccessDecision::deny(OWN_ONLY_REASON))
                }
            }
            AccessTier::Team => {
                if record_owner == Some(user_id) {
                    return Ok(AccessDecision::allow(tier));
                }

                // No record context at all (a CREATE-style check) passes,
                // matching the ownerless OWN case.
                if record_owner.is_none() && record_team.is_none() {
                    return Ok(AccessDecision::allow(tier));
                }

                let Some(record_team) = record_team else {
                    return Ok(AccessDecision::deny(TEAM_ONLY_REASON));
                };

                let user_team = self
                    .team_directory
                    .current_team_for_user(tenant_id, user_id)
                    .await?;
                if user_team == Some(record_team) {
                    Ok(AccessDecision::allow(tier))
                } else {
                    Ok(AccessDecision::deny(TEAM_ONLY_REASON))
                }
            }
        }
    }
}
