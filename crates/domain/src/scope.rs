use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crewdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organizational scope kinds a role can be granted within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Company-wide scope; carries no entity id.
    Company,
    /// One division, identified by a division id.
    Division,
    /// One team, identified by a team id.
    Team,
    /// One project, identified by a project id.
    Project,
}

impl ScopeType {
    /// Returns a stable storage value for this scope kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Division => "division",
            Self::Team => "team",
            Self::Project => "project",
        }
    }
}

impl FromStr for ScopeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "company" => Ok(Self::Company),
            "division" => Ok(Self::Division),
            "team" => Ok(Self::Team),
            "project" => Ok(Self::Project),
            _ => Err(AppError::Validation(format!(
                "unknown scope type '{value}'"
            ))),
        }
    }
}

impl Display for ScopeType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A validated scope value carried on role assignments.
///
/// `Company` never carries an entity id; the scoped kinds always do. The only
/// way to construct one from loose `(scope_type, scope_id)` data is
/// [`RoleScope::new`], which rejects malformed pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Company-wide scope.
    Company,
    /// One division.
    Division(Uuid),
    /// One team.
    Team(Uuid),
    /// One project.
    Project(Uuid),
}

impl RoleScope {
    /// Builds a scope from a kind and an optional entity id.
    ///
    /// Fails with a validation error when an id is supplied for the company
    /// scope or missing for a scoped kind.
    pub fn new(scope_type: ScopeType, scope_id: Option<Uuid>) -> AppResult<Self> {
        match (scope_type, scope_id) {
            (ScopeType::Company, None) => Ok(Self::Company),
            (ScopeType::Company, Some(_)) => Err(AppError::Validation(
                "company scope must not carry a scope id".to_owned(),
            )),
            (scoped, None) => Err(AppError::Validation(format!(
                "scope type '{scoped}' requires a scope id"
            ))),
            (ScopeType::Division, Some(id)) => Ok(Self::Division(id)),
            (ScopeType::Team, Some(id)) => Ok(Self::Team(id)),
            (ScopeType::Project, Some(id)) => Ok(Self::Project(id)),
        }
    }

    /// Returns the scope kind.
    #[must_use]
    pub fn kind(&self) -> ScopeType {
        match self {
            Self::Company => ScopeType::Company,
            Self::Division(_) => ScopeType::Division,
            Self::Team(_) => ScopeType::Team,
            Self::Project(_) => ScopeType::Project,
        }
    }

    /// Returns the scope-entity id for the scoped kinds.
    #[must_use]
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            Self::Company => None,
            Self::Division(id) | Self::Team(id) | Self::Project(id) => Some(*id),
        }
    }

    /// Returns true for the company-wide scope.
    #[must_use]
    pub fn is_company(&self) -> bool {
        matches!(self, Self::Company)
    }
}

impl Display for RoleScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.entity_id() {
            Some(id) => write!(formatter, "{} {id}", self.kind()),
            None => write!(formatter, "{}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;
    use uuid::Uuid;

    use super::{RoleScope, ScopeType};

    #[test]
    fn company_scope_rejects_entity_id() {
        let result = RoleScope::new(ScopeType::Company, Some(Uuid::new_v4()));
        assert!(result.is_err());
    }

    #[test]
    fn scoped_kind_requires_entity_id() {
        let result = RoleScope::new(ScopeType::Team, None);
        assert!(result.is_err());
    }

    #[test]
    fn scope_type_round_trips_storage_value() {
        for scope_type in [
            ScopeType::Company,
            ScopeType::Division,
            ScopeType::Team,
            ScopeType::Project,
        ] {
            let restored = ScopeType::from_str(scope_type.as_str());
            assert_eq!(restored.ok(), Some(scope_type));
        }
    }

    proptest! {
        #[test]
        fn scoped_kinds_preserve_entity_id(bytes in any::<[u8; 16]>()) {
            let id = Uuid::from_bytes(bytes);
            for scope_type in [ScopeType::Division, ScopeType::Team, ScopeType::Project] {
                let scope = RoleScope::new(scope_type, Some(id));
                prop_assert_eq!(scope.as_ref().ok().and_then(RoleScope::entity_id), Some(id));
                prop_assert_eq!(scope.ok().map(|value| value.kind()), Some(scope_type));
            }
        }
    }
}
