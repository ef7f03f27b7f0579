use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::AppError;

use crate::role::RoleId;
use crate::vocabulary::{EntityType, RecordAction};

/// Record-access tier attached to an entity permission statement.
///
/// Tiers are strictly ordered NONE < OWN < TEAM < ALL; aggregation keeps the
/// highest tier any contributing role grants for an (entity, action) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// No record access.
    None,
    /// Records owned by the requesting user only.
    Own,
    /// Records owned by the user or belonging to the user's team.
    Team,
    /// All records in the tenant.
    All,
}

impl AccessTier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Own => "own",
            Self::Team => "team",
            Self::All => "all",
        }
    }
}

impl FromStr for AccessTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "own" => Ok(Self::Own),
            "team" => Ok(Self::Team),
            "all" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown access tier '{value}'"
            ))),
        }
    }
}

impl Display for AccessTier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// One entity permission statement attached to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    /// Role the statement belongs to.
    pub role_id: RoleId,
    /// Governed entity type.
    pub entity: EntityType,
    /// Granted action.
    pub action: RecordAction,
    /// Record-access tier for the action.
    pub tier: AccessTier,
}

/// One field governance statement attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    /// Role the statement belongs to.
    pub role_id: RoleId,
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
    /// Optional mask pattern; see [`crate::mask_field_value`].
    pub mask_pattern: Option<String>,
}

/// Merged per-field access after aggregating all contributing roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAccess {
    /// Whether every contributing role allows viewing the field.
    pub can_view: bool,
    /// Whether every contributing role allows editing the field.
    pub can_edit: bool,
    /// Whether any contributing role demands masking.
    pub mask_value: bool,
    /// Mask pattern; the last non-empty pattern seen wins.
    pub mask_pattern: Option<String>,
}

impl FieldAccess {
    fn from_statement(statement: &FieldPermission) -> Self {
        Self {
            can_view: statement.can_view,
            can_edit: statement.can_edit,
            mask_value: statement.mask_value,
            mask_pattern: statement.mask_pattern.clone(),
        }
    }

    /// Folds another statement into the merged state.
    ///
    /// View/edit merge most-restrictive (AND): no role can unlock a field
    /// another role hid. Masking merges most-aggressive (OR): any role that
    /// insists on masking succeeds. The pattern is cosmetic, so the last
    /// non-empty one wins.
    pub fn merge(&mut self, statement: &FieldPermission) {
        self.can_view = self.can_view && statement.can_view;
        self.can_edit = self.can_edit && statement.can_edit;
        self.mask_value = self.mask_value || statement.mask_value;
        if statement
            .mask_pattern
            .as_deref()
            .is_some_and(|pattern| !pattern.is_empty())
        {
            self.mask_pattern = statement.mask_pattern.clone();
        }
    }
}

/// Fully merged, per-user permission state. Derived on every resolution,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissionSet {
    tiers: BTreeMap<EntityType, BTreeMap<RecordAction, AccessTier>>,
    fields: BTreeMap<EntityType, BTreeMap<String, FieldAccess>>,
}

impl EffectivePermissionSet {
    /// Creates an empty, maximally restrictive set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no role contributed any statement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty() && self.fields.is_empty()
    }

    /// Folds one entity permission statement in; the highest tier wins.
    pub fn apply_permission(&mut self, statement: &RolePermission) {
        let tier = self
            .tiers
            .entry(statement.entity)
            .or_default()
            .entry(statement.action)
            .or_insert(statement.tier);
        if statement.tier > *tier {
            *tier = statement.tier;
        }
    }

    /// Folds one field governance statement in; see [`FieldAccess::merge`].
    pub fn apply_field_permission(&mut self, statement: &FieldPermission) {
        self.fields
            .entry(statement.entity)
            .or_default()
            .entry(statement.field_name.clone())
            .and_modify(|access| access.merge(statement))
            .or_insert_with(|| FieldAccess::from_statement(statement));
    }

    /// Returns whether any statement exists for the entity.
    #[must_use]
    pub fn has_entity_permissions(&self, entity: EntityType) -> bool {
        self.tiers.contains_key(&entity)
    }

    /// Returns the effective tier for an (entity, action) pair.
    #[must_use]
    pub fn tier(&self, entity: EntityType, action: RecordAction) -> Option<AccessTier> {
        self.tiers
            .get(&entity)
            .and_then(|actions| actions.get(&action))
            .copied()
    }

    /// Returns the merged field governance map for an entity.
    #[must_use]
    pub fn entity_fields(&self, entity: EntityType) -> Option<&BTreeMap<String, FieldAccess>> {
        self.fields.get(&entity)
    }
}

/// Outcome of a record-level permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Denial reason for diagnostics and audit; absent on allow.
    pub reason: Option<String>,
    /// Effective tier echoed back so list queries can filter accordingly.
    pub tier: Option<AccessTier>,
}

impl AccessDecision {
    /// Creates an allowed decision carrying the effective tier.
    #[must_use]
    pub fn allow(tier: AccessTier) -> Self {
        Self {
            allowed: true,
            reason: None,
            tier: Some(tier),
        }
    }

    /// Creates an allowed decision granted outside the tier system.
    #[must_use]
    pub fn allow_supplemental() -> Self {
        Self {
            allowed: true,
            reason: None,
            tier: None,
        }
    }

    /// Creates a denied decision with a structured reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            tier: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::role::RoleId;
    use crate::vocabulary::{EntityType, RecordAction};

    use super::{AccessTier, EffectivePermissionSet, FieldPermission, RolePermission};

    fn tier_statement(tier: AccessTier) -> RolePermission {
        RolePermission {
            role_id: RoleId::new(),
            entity: EntityType::Contacts,
            action: RecordAction::View,
            tier,
        }
    }

    fn field_statement(can_view: bool, can_edit: bool, mask_value: bool) -> FieldPermission {
        FieldPermission {
            role_id: RoleId::new(),
            entity: EntityType::Contacts,
            field_name: "phone".to_owned(),
            can_view,
            can_edit,
            mask_value,
            mask_pattern: None,
        }
    }

    #[test]
    fn tiers_are_strictly_ordered() {
        assert!(AccessTier::None < AccessTier::Own);
        assert!(AccessTier::Own < AccessTier::Team);
        assert!(AccessTier::Team < AccessTier::All);
    }

    #[test]
    fn later_lower_tier_does_not_downgrade() {
        let mut set = EffectivePermissionSet::new();
        set.apply_permission(&tier_statement(AccessTier::All));
        set.apply_permission(&tier_statement(AccessTier::Own));
        assert_eq!(
            set.tier(EntityType::Contacts, RecordAction::View),
            Some(AccessTier::All)
        );
    }

    #[test]
    fn any_denying_role_wins_for_view() {
        let mut set = EffectivePermissionSet::new();
        set.apply_field_permission(&field_statement(true, true, false));
        set.apply_field_permission(&field_statement(false, true, false));

        let fields = set.entity_fields(EntityType::Contacts);
        let access = fields.and_then(|fields| fields.get("phone"));
        assert!(access.is_some_and(|access| !access.can_view && access.can_edit));
    }

    #[test]
    fn any_masking_role_wins() {
        let mut set = EffectivePermissionSet::new();
        set.apply_field_permission(&field_statement(true, true, false));
        set.apply_field_permission(&field_statement(true, true, true));

        let fields = set.entity_fields(EntityType::Contacts);
        let access = fields.and_then(|fields| fields.get("phone"));
        assert!(access.is_some_and(|access| access.mask_value));
    }

    #[test]
    fn last_non_empty_pattern_wins() {
        let mut set = EffectivePermissionSet::new();
        let mut first = field_statement(true, true, true);
        first.mask_pattern = Some("{{last4}}".to_owned());
        let mut second = field_statement(true, true, false);
        second.mask_pattern = Some(String::new());

        set.apply_field_permission(&first);
        set.apply_field_permission(&second);

        let fields = set.entity_fields(EntityType::Contacts);
        let pattern = fields
            .and_then(|fields| fields.get("phone"))
            .and_then(|access| access.mask_pattern.as_deref());
        assert_eq!(pattern, Some("{{last4}}"));
    }

    proptest! {
        #[test]
        fn aggregated_tier_is_maximum(first in 0usize..4, second in 0usize..4) {
            const TIERS: [AccessTier; 4] = [
                AccessTier::None,
                AccessTier::Own,
                AccessTier::Team,
                AccessTier::All,
            ];

            let mut set = EffectivePermissionSet::new();
            set.apply_permission(&tier_statement(TIERS[first]));
            set.apply_permission(&tier_statement(TIERS[second]));

            prop_assert_eq!(
                set.tier(EntityType::Contacts, RecordAction::View),
                Some(TIERS[first.max(second)])
            );
        }
    }
}
