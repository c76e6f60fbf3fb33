use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by role-assignment writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is assigned, including seat installations.
    RoleAssigned,
    /// Emitted when a role is revoked, including seat vacations.
    RoleRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleAssigned => "role.assigned",
            Self::RoleRevoked => "role.revoked",
        }
    }
}
