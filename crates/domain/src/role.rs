use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crewdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::ScopeType;

/// Identifier for a role definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
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

/// Canonical role names with one fixed numeric level each.
///
/// A role's meaning in context comes from the scope of its assignment; the
/// level only orders roles when computing the "highest role" projection.
/// Role rows in the store may carry names outside this set; those rank at
/// level zero and never hold a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Company administrator; passes every resource and approval check.
    Admin,
    /// Head of one division. Seat role.
    DivisionHead,
    /// Company-wide HR manager; approves HR request types for anyone.
    HrManager,
    /// Leader of one team. Seat role.
    TeamLeader,
    /// Manager of one project. Seat role.
    ProjectManager,
    /// Baseline role every user retains.
    Employee,
}

impl RoleName {
    /// Returns a stable storage value for this role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::DivisionHead => "division_head",
            Self::HrManager => "hr_manager",
            Self::TeamLeader => "team_leader",
            Self::ProjectManager => "project_manager",
            Self::Employee => "employee",
        }
    }

    /// Returns the fixed comparison level for this role.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Self::Admin => 100,
            Self::DivisionHead => 80,
            Self::HrManager => 70,
            Self::TeamLeader => 60,
            Self::ProjectManager => 50,
            Self::Employee => 10,
        }
    }

    /// Returns the scope kind this role is a seat within, if it is a seat role.
    #[must_use]
    pub fn seat_scope(&self) -> Option<ScopeType> {
        match self {
            Self::DivisionHead => Some(ScopeType::Division),
            Self::TeamLeader => Some(ScopeType::Team),
            Self::ProjectManager => Some(ScopeType::Project),
            _ => None,
        }
    }

    /// Returns the seat role owning the given scope kind, if any.
    #[must_use]
    pub fn seat_for_scope(scope_type: ScopeType) -> Option<Self> {
        match scope_type {
            ScopeType::Division => Some(Self::DivisionHead),
            ScopeType::Team => Some(Self::TeamLeader),
            ScopeType::Project => Some(Self::ProjectManager),
            ScopeType::Company => None,
        }
    }

    /// Returns the baseline role auto-granted when a user would otherwise
    /// hold zero roles.
    #[must_use]
    pub fn baseline() -> Self {
        Self::Employee
    }

    /// Returns all canonical roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleName] = &[
            RoleName::Admin,
            RoleName::DivisionHead,
            RoleName::HrManager,
            RoleName::TeamLeader,
            RoleName::ProjectManager,
            RoleName::Employee,
        ];

        ALL
    }
}

impl FromStr for RoleName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "division_head" => Ok(Self::DivisionHead),
            "hr_manager" => Ok(Self::HrManager),
            "team_leader" => Ok(Self::TeamLeader),
            "project_manager" => Ok(Self::ProjectManager),
            "employee" => Ok(Self::Employee),
            _ => Err(AppError::Validation(format!("unknown role name '{value}'"))),
        }
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Returns the comparison level for a stored role name.
///
/// Names outside the canonical set rank at zero.
#[must_use]
pub fn role_level(name: &str) -> u8 {
    RoleName::from_str(name).map_or(0, |role| role.level())
}

/// A live role definition row from the role catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
}

impl RoleRecord {
    /// Parses the stored name into a canonical role, if it is one.
    #[must_use]
    pub fn canonical_name(&self) -> Option<RoleName> {
        RoleName::from_str(self.name.as_str()).ok()
    }

    /// Validates that a canonical role exists for the stored name.
    pub fn require_canonical(&self) -> AppResult<RoleName> {
        RoleName::from_str(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{RoleName, role_level};

    #[test]
    fn seat_roles_map_to_their_scope_kind() {
        for role in RoleName::all() {
            match role.seat_scope() {
                Some(scope_type) => {
                    assert_eq!(RoleName::seat_for_scope(scope_type), Some(*role));
                }
                None => assert!(matches!(
                    role,
                    RoleName::Admin | RoleName::HrManager | RoleName::Employee
                )),
            }
        }
    }

    #[test]
    fn unknown_role_names_rank_at_zero() {
        assert_eq!(role_level("janitor_in_chief"), 0);
        assert!(role_level("admin") > role_level("employee"));
    }

    #[test]
    fn levels_are_strictly_ordered() {
        let mut levels: Vec<u8> = RoleName::all().iter().map(RoleName::level).collect();
        levels.sort_unstable();
        levels.dedup();
        assert_eq!(levels.len(), RoleName::all().len());
    }

    proptest! {
        #[test]
        fn canonical_names_round_trip(index in 0usize..6) {
            let role = RoleName::all()[index];
            prop_assert_eq!(RoleName::from_str(role.as_str()).ok(), Some(role));
        }
    }
}
