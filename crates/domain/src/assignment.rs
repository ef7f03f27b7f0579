use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::UserId;

use crate::role::RoleId;

/// Unique identifier for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(Uuid);

impl TeamId {
    /// Creates a new random team identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a team identifier from an existing UUID value.
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

impl Default for TeamId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TeamId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Grant of a role to a user, optionally bounded by a validity window.
///
/// Expired assignments are retained for history and excluded from
/// resolution; revocation sets `expires_at`, it never deletes the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// User the role is granted to.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Start of the validity window.
    pub starts_at: DateTime<Utc>,
    /// End of the validity window; unset means never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Returns whether the assignment contributes permissions at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.starts_at > now {
            return false;
        }

        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use warden_core::UserId;

    use crate::role::RoleId;

    use super::RoleAssignment;

    fn assignment() -> RoleAssignment {
        RoleAssignment {
            user_id: UserId::new(),
            role_id: RoleId::new(),
            starts_at: Utc::now() - Duration::days(1),
            expires_at: None,
        }
    }

    #[test]
    fn open_ended_assignment_is_active() {
        assert!(assignment().is_active_at(Utc::now()));
    }

    #[test]
    fn expired_assignment_is_inactive() {
        let mut expired = assignment();
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(!expired.is_active_at(Utc::now()));
    }

    #[test]
    fn future_assignment_is_not_yet_active() {
        let mut future = assignment();
        future.starts_at = Utc::now() + Duration::hours(1);
        assert!(!future.is_active_at(Utc::now()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let mut boundary = assignment();
        boundary.expires_at = Some(now);
        assert!(!boundary.is_active_at(now));
    }
}
