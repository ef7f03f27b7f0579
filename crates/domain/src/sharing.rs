use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use warden_core::{AppError, AppResult, UserId};

use crate::assignment::TeamId;
use crate::role::RoleId;
use crate::vocabulary::{EntityType, RecordAction};

/// Unique identifier for a data sharing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharingRuleId(Uuid);

impl SharingRuleId {
    /// Creates a new random sharing rule identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a sharing rule identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SharingRuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SharingRuleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Audience a sharing rule grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShareTarget {
    /// Every user in the tenant.
    Public,
    /// One specific user.
    User {
        /// Targeted user.
        user_id: UserId,
    },
    /// Every member of one team.
    Team {
        /// Targeted team.
        team_id: TeamId,
    },
    /// Every holder of one role (raw assignment, hierarchy not expanded).
    Role {
        /// Targeted role.
        role_id: RoleId,
    },
}

impl ShareTarget {
    /// Returns whether the target covers the given user context.
    #[must_use]
    pub fn matches(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
        role_ids: &HashSet<RoleId>,
    ) -> bool {
        match self {
            Self::Public => true,
            Self::User {
                user_id: target_user,
            } => *target_user == user_id,
            Self::Team {
                team_id: target_team,
            } => team_id.is_some_and(|team| team == *target_team),
            Self::Role {
                role_id: target_role,
            } => role_ids.contains(target_role),
        }
    }
}

/// Comparison operator used by sharing rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// True when the record value equals the configured value.
    Equals,
    /// True when the record value does not equal the configured value.
    NotEquals,
    /// True when the stringified record value contains the stringified
    /// configured value as a substring.
    Contains,
    /// True when the record value is a member of the configured array.
    In,
}

impl ConditionOperator {
    /// Returns a stable storage value for this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::In => "in",
        }
    }
}

impl FromStr for ConditionOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "in" => Ok(Self::In),
            _ => Err(AppError::Validation(format!(
                "unknown condition operator '{value}'"
            ))),
        }
    }
}

/// One typed predicate evaluated against a candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCondition {
    /// Dot-separated path into the record payload.
    pub field_path: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Configured comparison value; an array for the `in` operator.
    pub value: Value,
}

impl ShareCondition {
    /// Validates operator/value shape at rule creation time.
    pub fn validate(&self) -> AppResult<()> {
        if self.field_path.trim().is_empty() {
            return Err(AppError::Validation(
                "condition field path must not be empty".to_owned(),
            ));
        }

        if self.operator == ConditionOperator::In && !self.value.is_array() {
            return Err(AppError::Validation(format!(
                "condition on '{}' uses operator 'in' without an array value",
                self.field_path
            )));
        }

        Ok(())
    }

    /// Evaluates the condition against a candidate record.
    ///
    /// A missing path resolves to `Null`, so `equals` fails and `not_equals`
    /// succeeds against absent fields.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        let record_value = resolve_path(record, self.field_path.as_str());

        match self.operator {
            ConditionOperator::Equals => record_value == &self.value,
            ConditionOperator::NotEquals => record_value != &self.value,
            ConditionOperator::Contains => {
                coerce_to_string(record_value).contains(coerce_to_string(&self.value).as_str())
            }
            ConditionOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.contains(record_value)),
        }
    }
}

fn resolve_path<'record>(record: &'record Value, path: &str) -> &'record Value {
    let mut current = record;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return &Value::Null,
        }
    }

    current
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(content) => content.clone(),
        other => other.to_string(),
    }
}

/// Supplemental, condition-gated grant evaluated when the role system denies.
///
/// Sharing rules only ever add access; a non-matching rule set leaves the
/// base decision untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSharingRule {
    /// Stable rule identifier.
    pub rule_id: SharingRuleId,
    /// Entity the rule applies to.
    pub entity: EntityType,
    /// Actions the rule can unlock.
    pub actions: Vec<RecordAction>,
    /// Whether the rule participates in evaluation.
    pub is_active: bool,
    /// Audience the rule grants access to.
    pub share_with: ShareTarget,
    /// Conditions that must all match; an empty list grants unconditionally.
    pub conditions: Vec<ShareCondition>,
}

impl DataSharingRule {
    /// Returns whether the rule unlocks the action for the given record.
    #[must_use]
    pub fn grants(&self, action: RecordAction, record: &Value) -> bool {
        if !self.is_active || !self.actions.contains(&action) {
            return false;
        }

        self.conditions
            .iter()
            .all(|condition| condition.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;
    use warden_core::UserId;

    use crate::assignment::TeamId;
    use crate::role::RoleId;
    use crate::vocabulary::{EntityType, RecordAction};

    use super::{
        ConditionOperator, DataSharingRule, ShareCondition, ShareTarget, SharingRuleId,
    };

    fn condition(path: &str, operator: ConditionOperator, value: serde_json::Value) -> ShareCondition {
        ShareCondition {
            field_path: path.to_owned(),
            operator,
            value,
        }
    }

    #[test]
    fn equals_matches_typed_value() {
        let record = json!({ "status": "open", "amount": 12 });
        assert!(condition("status", ConditionOperator::Equals, json!("open")).matches(&record));
        assert!(condition("amount", ConditionOperator::Equals, json!(12)).matches(&record));
        assert!(!condition("amount", ConditionOperator::Equals, json!("12")).matches(&record));
    }

    #[test]
    fn not_equals_matches_missing_field() {
        let record = json!({ "status": "open" });
        assert!(condition("region", ConditionOperator::NotEquals, json!("emea")).matches(&record));
    }

    #[test]
    fn contains_coerces_both_sides() {
        let record = json!({ "phone": 4471234, "notes": "call before noon" });
        assert!(condition("notes", ConditionOperator::Contains, json!("before")).matches(&record));
        assert!(condition("phone", ConditionOperator::Contains, json!(7123)).matches(&record));
    }

    #[test]
    fn in_requires_array_membership() {
        let record = json!({ "stage": "negotiation" });
        let matching = condition(
            "stage",
            ConditionOperator::In,
            json!(["proposal", "negotiation"]),
        );
        let non_array = condition("stage", ConditionOperator::In, json!("negotiation"));
        assert!(matching.matches(&record));
        assert!(!non_array.matches(&record));
        assert!(non_array.validate().is_err());
    }

    #[test]
    fn nested_path_resolution() {
        let record = json!({ "owner": { "region": "uk" } });
        assert!(condition("owner.region", ConditionOperator::Equals, json!("uk")).matches(&record));
    }

    #[test]
    fn share_target_matching() {
        let user_id = UserId::new();
        let team_id = TeamId::new();
        let role_id = RoleId::new();
        let role_ids = HashSet::from([role_id]);

        assert!(ShareTarget::Public.matches(user_id, None, &HashSet::new()));
        assert!(ShareTarget::User { user_id }.matches(user_id, None, &HashSet::new()));
        assert!(ShareTarget::Team { team_id }.matches(user_id, Some(team_id), &HashSet::new()));
        assert!(!ShareTarget::Team { team_id }.matches(user_id, None, &HashSet::new()));
        assert!(ShareTarget::Role { role_id }.matches(user_id, None, &role_ids));
    }

    #[test]
    fn rule_without_conditions_grants_unconditionally() {
        let rule = DataSharingRule {
            rule_id: SharingRuleId::new(),
            entity: EntityType::Deals,
            actions: vec![RecordAction::View],
            is_active: true,
            share_with: ShareTarget::Public,
            conditions: Vec::new(),
        };

        assert!(rule.grants(RecordAction::View, &json!({})));
        assert!(!rule.grants(RecordAction::Edit, &json!({})));
    }

    #[test]
    fn inactive_rule_grants_nothing() {
        let rule = DataSharingRule {
            rule_id: SharingRuleId::new(),
            entity: EntityType::Deals,
            actions: vec![RecordAction::View],
            is_active: false,
            share_with: ShareTarget::Public,
            conditions: Vec::new(),
        };

        assert!(!rule.grants(RecordAction::View, &json!({})));
    }
}
