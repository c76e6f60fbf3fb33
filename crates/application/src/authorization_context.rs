use std::sync::Arc;

use crewdesk_core::{AppResult, UserId, UserIdentity};
use crewdesk_domain::{RoleContext, RoleName, ScopeType};
use uuid::Uuid;

use crate::{RoleAssignmentRepository, RoleContextService, UserDirectory};

/// Request types any company-level HR manager may approve regardless of
/// organizational relationship, in both alias spellings.
const HR_APPROVABLE_REQUEST_TYPES: &[&str] = &["day-off", "day_off", "remote-work", "remote_work"];

/// Builds per-request authorization contexts from cached role contexts.
///
/// This is the only component that constructs [`AuthorizationContext`]; it
/// owns the handles the context needs, so no decision logic ever reaches for
/// ambient service discovery.
#[derive(Clone)]
pub struct AuthorizationService {
    contexts: RoleContextService,
    assignments: Arc<dyn RoleAssignmentRepository>,
    users: Arc<dyn UserDirectory>,
}

impl AuthorizationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        contexts: RoleContextService,
        assignments: Arc<dyn RoleAssignmentRepository>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            contexts,
            assignments,
            users,
        }
    }

    /// Builds the decision object for one authenticated user, reading the
    /// role context through the cache.
    pub async fn context_for(&self, identity: &UserIdentity) -> AppResult<AuthorizationContext> {
        let role_context = self
            .contexts
            .get_user_role_context(identity.user_id())
            .await?;

        Ok(AuthorizationContext {
            identity: identity.clone(),
            role_context,
            assignments: self.assignments.clone(),
            users: self.users.clone(),
        })
    }
}

/// Short-lived, read-only decision object over one user's role context.
///
/// Constructed once per request and never mutated. All methods are pure
/// lookups over the cached projection except [`can_approve_request`] and
/// [`can_access_resource`], which suspend on store reads.
///
/// [`can_approve_request`]: AuthorizationContext::can_approve_request
/// [`can_access_resource`]: AuthorizationContext::can_access_resource
pub struct AuthorizationContext {
    identity: UserIdentity,
    role_context: RoleContext,
    assignments: Arc<dyn RoleAssignmentRepository>,
    users: Arc<dyn UserDirectory>,
}

impl AuthorizationContext {
    /// Returns the user the context was built for.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.identity.user_id()
    }

    /// Returns the email the context was built with, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.identity.email()
    }

    /// Returns the underlying role context.
    #[must_use]
    pub fn role_context(&self) -> &RoleContext {
        &self.role_context
    }

    /// Returns true when the user holds the role, optionally narrowed to a
    /// scope kind or an exact scope.
    #[must_use]
    pub fn has_role(
        &self,
        role_name: &str,
        scope_type: Option<ScopeType>,
        scope_id: Option<Uuid>,
    ) -> bool {
        self.role_context.has_role(role_name, scope_type, scope_id)
    }

    /// Returns true when the user holds any of the roles.
    #[must_use]
    pub fn has_any_role(
        &self,
        role_names: &[&str],
        scope_type: Option<ScopeType>,
        scope_id: Option<Uuid>,
    ) -> bool {
        self.role_context
            .has_any_role(role_names, scope_type, scope_id)
    }

    /// Returns the precomputed highest role for a scope.
    ///
    /// Scoped kinds queried without an entity id return `None`; there is no
    /// aggregate "highest across all scopes of a kind".
    #[must_use]
    pub fn highest_role(&self, scope_type: ScopeType, scope_id: Option<Uuid>) -> Option<&str> {
        self.role_context.highest_role(scope_type, scope_id)
    }

    /// Returns true when the user is a company-level administrator.
    #[must_use]
    pub fn is_company_admin(&self) -> bool {
        self.has_role(RoleName::Admin.as_str(), Some(ScopeType::Company), None)
    }

    /// Decides whether the user may access a managed resource.
    ///
    /// Company administrators always pass; otherwise the user must hold the
    /// manager seat of the matching kind for that exact resource. Unknown
    /// resource types are denied.
    pub async fn can_access_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> AppResult<bool> {
        if self.is_company_admin() {
            return Ok(true);
        }

        let allowed = match resource_type {
            "division" => self.has_role(
                RoleName::DivisionHead.as_str(),
                Some(ScopeType::Division),
                Some(resource_id),
            ),
            "team" => self.has_role(
                RoleName::TeamLeader.as_str(),
                Some(ScopeType::Team),
                Some(resource_id),
            ),
            "project" => self.has_role(
                RoleName::ProjectManager.as_str(),
                Some(ScopeType::Project),
                Some(resource_id),
            ),
            _ => false,
        };

        Ok(allowed)
    }

    /// Decides whether the user may approve a request owned by another user.
    ///
    /// Company administrators always pass. HR request types are approvable
    /// by any company-level HR manager. Otherwise the user must hold the
    /// manager seat for some scope the owner participates in. A missing
    /// owner record denies (fail closed).
    pub async fn can_approve_request(
        &self,
        owner_id: UserId,
        request_type: &str,
    ) -> AppResult<bool> {
        if self.is_company_admin() {
            return Ok(true);
        }

        if HR_APPROVABLE_REQUEST_TYPES.contains(&request_type)
            && self.has_role(RoleName::HrManager.as_str(), Some(ScopeType::Company), None)
        {
            return Ok(true);
        }

        if self.users.find_user(owner_id).await?.is_none() {
            return Ok(false);
        }

        let owner_assignments = self.assignments.list_live_by_user(owner_id).await?;
        for assignment in owner_assignments {
            let Some(manager_role) = RoleName::seat_for_scope(assignment.scope.kind()) else {
                continue;
            };
            if self.has_role(
                manager_role.as_str(),
                Some(assignment.scope.kind()),
                assignment.scope.entity_id(),
            ) {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
