use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppError, AppResult, NonEmptyString};

/// Unique identifier for a role definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Distinguishes seeded system roles from tenant-created ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Role installed by the seed routine; protected from deletion.
    System,
    /// Role created by a tenant administrator.
    Custom,
}

impl RoleType {
    /// Returns a stable storage value for this role type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for RoleType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!("unknown role type '{value}'"))),
        }
    }
}

/// A named, hierarchical authorization unit.
///
/// The parent reference forms a single-parent chain. Cycle prevention is the
/// role administration service's responsibility at edit time; resolution
/// treats a cyclic chain as a configuration defect and truncates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    name: NonEmptyString,
    display_name: NonEmptyString,
    level: i32,
    role_type: RoleType,
    is_active: bool,
    parent_role_id: Option<RoleId>,
}

impl Role {
    /// Creates a role with validated names.
    pub fn new(
        role_id: RoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        level: i32,
        role_type: RoleType,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if !name
            .as_str()
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
        {
            return Err(AppError::Validation(format!(
                "role name '{name}' must use lowercase letters, digits, and underscores"
            )));
        }

        if parent_role_id == Some(role_id) {
            return Err(AppError::Validation(format!(
                "role '{name}' cannot be its own parent"
            )));
        }

        Ok(Self {
            role_id,
            name,
            display_name: NonEmptyString::new(display_name)?,
            level,
            role_type,
            is_active: true,
            parent_role_id,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the unique role name in tenant scope.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the display (human-friendly) name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the seniority level, used only for display and sorting.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the role type.
    #[must_use]
    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    /// Returns whether the role currently contributes permissions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the parent role reference, if any.
    #[must_use]
    pub fn parent_role_id(&self) -> Option<RoleId> {
        self.parent_role_id
    }

    /// Returns a copy with the active flag replaced.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns a copy with the parent reference replaced.
    #[must_use]
    pub fn with_parent(mut self, parent_role_id: Option<RoleId>) -> Self {
        self.parent_role_id = parent_role_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleId, RoleType};

    #[test]
    fn role_rejects_uppercase_name() {
        let result = Role::new(
            RoleId::new(),
            "Sales Rep",
            "Sales Representative",
            10,
            RoleType::Custom,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn role_rejects_self_parent() {
        let role_id = RoleId::new();
        let result = Role::new(
            role_id,
            "sales_rep",
            "Sales Representative",
            10,
            RoleType::Custom,
            Some(role_id),
        );
        assert!(result.is_err());
    }

    #[test]
    fn role_starts_active() {
        let role = Role::new(
            RoleId::new(),
            "read_only",
            "Read Only",
            0,
            RoleType::System,
            None,
        );
        assert!(role.is_ok_and(|role| role.is_active()));
    }
}
