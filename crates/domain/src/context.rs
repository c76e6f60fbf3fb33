use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crewdesk_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::role_level;
use crate::scope::{RoleScope, ScopeType};

/// One live role membership inside a cached role context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMembership {
    /// Role name held by the user.
    pub role_name: String,
    /// Scope the role is held within.
    pub scope: RoleScope,
    /// Human-readable scope-entity name, resolved best-effort.
    pub scope_name: Option<String>,
    /// When the membership was assigned.
    pub assigned_at: DateTime<Utc>,
}

/// Per-scope "highest role" projection, keyed by scope-entity id for the
/// scoped kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighestRoleIndex {
    /// Highest company-scoped role name, if any.
    pub company: Option<String>,
    /// Highest role name per division id.
    pub division: BTreeMap<Uuid, String>,
    /// Highest role name per team id.
    pub team: BTreeMap<Uuid, String>,
    /// Highest role name per project id.
    pub project: BTreeMap<Uuid, String>,
}

impl HighestRoleIndex {
    fn record(&mut self, role_name: &str, scope: &RoleScope) {
        match scope {
            RoleScope::Company => replace_if_higher(&mut self.company, role_name),
            RoleScope::Division(id) => record_scoped(&mut self.division, *id, role_name),
            RoleScope::Team(id) => record_scoped(&mut self.team, *id, role_name),
            RoleScope::Project(id) => record_scoped(&mut self.project, *id, role_name),
        }
    }

    /// Returns the highest role for a scope kind and optional entity id.
    ///
    /// Scoped kinds without an entity id have no defined aggregate and always
    /// return `None`.
    #[must_use]
    pub fn for_scope(&self, scope_type: ScopeType, scope_id: Option<Uuid>) -> Option<&str> {
        match scope_type {
            ScopeType::Company => self.company.as_deref(),
            ScopeType::Division => lookup_scoped(&self.division, scope_id),
            ScopeType::Team => lookup_scoped(&self.team, scope_id),
            ScopeType::Project => lookup_scoped(&self.project, scope_id),
        }
    }
}

fn replace_if_higher(slot: &mut Option<String>, candidate: &str) {
    let keep = slot
        .as_deref()
        .is_some_and(|current| role_level(current) >= role_level(candidate));
    if !keep {
        *slot = Some(candidate.to_owned());
    }
}

fn record_scoped(slots: &mut BTreeMap<Uuid, String>, id: Uuid, candidate: &str) {
    let keep = slots
        .get(&id)
        .is_some_and(|current| role_level(current) >= role_level(candidate));
    if !keep {
        slots.insert(id, candidate.to_owned());
    }
}

fn lookup_scoped(slots: &BTreeMap<Uuid, String>, scope_id: Option<Uuid>) -> Option<&str> {
    scope_id.and_then(|id| slots.get(&id).map(String::as_str))
}

/// Cached projection of one user's live role memberships.
///
/// Built once from the assignment store, cached with a bounded TTL, and never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleContext {
    /// User the projection belongs to.
    pub user_id: UserId,
    /// Live memberships, enriched with scope names where resolvable.
    pub memberships: Vec<RoleMembership>,
    /// Precomputed highest-role-per-scope index.
    pub highest_roles: HighestRoleIndex,
    /// When the projection was materialized.
    pub cached_at: DateTime<Utc>,
}

impl RoleContext {
    /// Builds a projection from live memberships, computing the highest-role
    /// index by fixed role level.
    #[must_use]
    pub fn from_memberships(
        user_id: UserId,
        memberships: Vec<RoleMembership>,
        cached_at: DateTime<Utc>,
    ) -> Self {
        let mut highest_roles = HighestRoleIndex::default();
        for membership in &memberships {
            highest_roles.record(membership.role_name.as_str(), &membership.scope);
        }

        Self {
            user_id,
            memberships,
            highest_roles,
            cached_at,
        }
    }

    /// Returns true when the user holds the role, optionally narrowed to a
    /// scope kind or an exact scope.
    ///
    /// With no scope kind given, any scope matches and `scope_id` is ignored.
    #[must_use]
    pub fn has_role(
        &self,
        role_name: &str,
        scope_type: Option<ScopeType>,
        scope_id: Option<Uuid>,
    ) -> bool {
        self.memberships.iter().any(|membership| {
            if membership.role_name != role_name {
                return false;
            }

            let Some(kind) = scope_type else {
                return true;
            };

            if membership.scope.kind() != kind {
                return false;
            }

            match scope_id {
                Some(id) => membership.scope.entity_id() == Some(id),
                None => true,
            }
        })
    }

    /// Returns true when the user holds any of the roles under the same
    /// narrowing rules as [`RoleContext::has_role`].
    #[must_use]
    pub fn has_any_role(
        &self,
        role_names: &[&str],
        scope_type: Option<ScopeType>,
        scope_id: Option<Uuid>,
    ) -> bool {
        role_names
            .iter()
            .any(|role_name| self.has_role(role_name, scope_type, scope_id))
    }

    /// Returns the precomputed highest role for a scope.
    #[must_use]
    pub fn highest_role(&self, scope_type: ScopeType, scope_id: Option<Uuid>) -> Option<&str> {
        self.highest_roles.for_scope(scope_type, scope_id)
    }
}
