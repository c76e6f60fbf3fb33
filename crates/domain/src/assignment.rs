use chrono::{DateTime, Utc};
use crewdesk_core::UserId;
use uuid::Uuid;

use crate::role::RoleId;
use crate::scope::RoleScope;

/// One role granted to one user within one scope.
///
/// Assignments are never updated in place: a change of role or scope is
/// modeled as a revocation plus a new assignment. Revocation is a soft
/// delete so history stays queryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Stable assignment identifier.
    pub id: Uuid,
    /// User holding the role.
    pub user_id: UserId,
    /// Assigned role identifier.
    pub role_id: RoleId,
    /// Assigned role name, resolved from the role catalog.
    pub role_name: String,
    /// Scope the role is granted within.
    pub scope: RoleScope,
    /// User that created the assignment, when known.
    pub assigned_by: Option<UserId>,
    /// Creation timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Soft-revocation timestamp; `None` while the assignment is live.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Returns true while the assignment has not been revoked.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// One item of a bulk assignment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentRequest {
    /// Target user.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Scope to assign the role within.
    pub scope: RoleScope,
}
