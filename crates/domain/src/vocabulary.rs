use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::AppError;

/// Business entity types governed by permission statements.
///
/// The vocabulary is closed: a misspelled entity name fails at parse time
/// with a validation error instead of resolving to a silent denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Contact records.
    Contacts,
    /// Company records.
    Companies,
    /// Deal records.
    Deals,
    /// Quote records.
    Quotes,
    /// Task records.
    Tasks,
    /// Product catalog records.
    Products,
    /// User accounts.
    Users,
    /// Role definitions.
    Roles,
    /// Tenant settings.
    Settings,
}

impl EntityType {
    /// Returns a stable storage value for this entity type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Deals => "deals",
            Self::Quotes => "quotes",
            Self::Tasks => "tasks",
            Self::Products => "products",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Settings => "settings",
        }
    }

    /// Returns all known entity types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityType] = &[
            EntityType::Contacts,
            EntityType::Companies,
            EntityType::Deals,
            EntityType::Quotes,
            EntityType::Tasks,
            EntityType::Products,
            EntityType::Users,
            EntityType::Roles,
            EntityType::Settings,
        ];

        ALL
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "contacts" => Ok(Self::Contacts),
            "companies" => Ok(Self::Companies),
            "deals" => Ok(Self::Deals),
            "quotes" => Ok(Self::Quotes),
            "tasks" => Ok(Self::Tasks),
            "products" => Ok(Self::Products),
            "users" => Ok(Self::Users),
            "roles" => Ok(Self::Roles),
            "settings" => Ok(Self::Settings),
            _ => Err(AppError::Validation(format!(
                "unknown entity type '{value}'"
            ))),
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Actions a permission statement may grant on an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordAction {
    /// Read a record or list records.
    View,
    /// Create a new record.
    Create,
    /// Modify an existing record.
    Edit,
    /// Delete a record.
    Delete,
    /// Export records in bulk.
    Export,
    /// Import records in bulk.
    Import,
    /// Reassign a record to another owner.
    Assign,
}

impl RecordAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
            Self::Export => "EXPORT",
            Self::Import => "IMPORT",
            Self::Assign => "ASSIGN",
        }
    }
}

impl FromStr for RecordAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEW" => Ok(Self::View),
            "CREATE" => Ok(Self::Create),
            "EDIT" => Ok(Self::Edit),
            "DELETE" => Ok(Self::Delete),
            "EXPORT" => Ok(Self::Export),
            "IMPORT" => Ok(Self::Import),
            "ASSIGN" => Ok(Self::Assign),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

impl Display for RecordAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}
