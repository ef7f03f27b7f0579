use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a role's parent reference changes.
    RoleParentChanged,
    /// Emitted when a role is deactivated.
    RoleDeactivated,
    /// Emitted when a role is reactivated.
    RoleReactivated,
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a role assignment is revoked.
    RoleRevoked,
    /// Emitted when a data sharing rule is created.
    SharingRuleCreated,
    /// Emitted when a sharing rule grants access the role system denied.
    SharingGrantUsed,
    /// Emitted once per seed run that installed at least one role.
    RolesSeeded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "security.role.created",
            Self::RoleParentChanged => "security.role.parent_changed",
            Self::RoleDeactivated => "security.role.deactivated",
            Self::RoleReactivated => "security.role.reactivated",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleRevoked => "security.role.revoked",
            Self::SharingRuleCreated => "security.sharing_rule.created",
            Self::SharingGrantUsed => "security.sharing_grant.used",
            Self::RolesSeeded => "security.roles.seeded",
        }
    }
}
