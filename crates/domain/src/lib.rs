//! Domain entities and invariants for the Warden authorization engine.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod masking;
mod permission;
mod role;
mod sharing;
mod vocabulary;

pub use assignment::{RoleAssignment, TeamId};
pub use audit::AuditAction;
pub use masking::mask_field_value;
pub use permission::{
    AccessDecision, AccessTier, EffectivePermissionSet, FieldAccess, FieldPermission,
    RolePermission,
};
pub use role::{Role, RoleId, RoleType};
pub use sharing::{
    ConditionOperator, DataSharingRule, ShareCondition, ShareTarget, SharingRuleId,
};
pub use vocabulary::{EntityType, RecordAction};
