use std::sync::Arc;

use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::{RoleAssignment, RoleId, RoleName, RoleRecord, RoleScope, ScopeType};
use uuid::Uuid;

use crate::{
    RoleAssignmentService, RoleCatalog, RoleContextService, ScopeValidator, SeatInstallation,
    SeatRepository, SeatVacancy, UserDirectory,
};

/// Scope-entity ids supplied by the caller when routing assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentRouting {
    /// Project context for `project_manager` routing or project-scoped roles.
    pub project_id: Option<Uuid>,
    /// Team context for `team_leader` routing or team-scoped roles.
    pub team_id: Option<Uuid>,
    /// Division context for `division_head` routing or division-scoped roles.
    pub division_id: Option<Uuid>,
}

impl AssignmentRouting {
    fn context_id_for(&self, scope_type: ScopeType) -> Option<Uuid> {
        match scope_type {
            ScopeType::Project => self.project_id,
            ScopeType::Team => self.team_id,
            ScopeType::Division => self.division_id,
            ScopeType::Company => None,
        }
    }

    fn derived_scope(&self) -> RoleScope {
        if let Some(id) = self.project_id {
            RoleScope::Project(id)
        } else if let Some(id) = self.team_id {
            RoleScope::Team(id)
        } else if let Some(id) = self.division_id {
            RoleScope::Division(id)
        } else {
            RoleScope::Company
        }
    }
}

/// Result payload for one routed assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedOutcome {
    /// The created assignment.
    pub assignment: RoleAssignment,
    /// The replaced seat holder, when the route installed a seat.
    pub replaced_user: Option<UserId>,
}

/// Per-user result of a routed assignment call.
#[derive(Debug)]
pub struct RoutedAssignment {
    /// Target user.
    pub user_id: UserId,
    /// The user's own success or failure.
    pub result: AppResult<RoutedOutcome>,
}

/// Routed assignment results with a success/failure summary.
#[derive(Debug)]
pub struct RoutedAssignments {
    /// Per-user outcomes, in request order.
    pub results: Vec<RoutedAssignment>,
    /// Number of successful items.
    pub succeeded: usize,
    /// Number of failed items.
    pub failed: usize,
}

/// Enforces the single-holder invariant for the exclusive positional roles
/// and cascades the consequences of losing a seat.
#[derive(Clone)]
pub struct SeatService {
    seats: Arc<dyn SeatRepository>,
    catalog: Arc<dyn RoleCatalog>,
    users: Arc<dyn UserDirectory>,
    scope_validator: ScopeValidator,
    assignments: RoleAssignmentService,
    contexts: RoleContextService,
}

impl SeatService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        seats: Arc<dyn SeatRepository>,
        catalog: Arc<dyn RoleCatalog>,
        users: Arc<dyn UserDirectory>,
        scope_validator: ScopeValidator,
        assignments: RoleAssignmentService,
        contexts: RoleContextService,
    ) -> Self {
        Self {
            seats,
            catalog,
            users,
            scope_validator,
            assignments,
            contexts,
        }
    }

    /// Installs a user into the exclusive seat of a scope, replacing the
    /// current holder if one exists.
    ///
    /// The replacement runs as one atomic store transaction; afterwards both
    /// affected users' cached role contexts are invalidated. The returned
    /// replaced user, if any, lets the caller trigger downstream
    /// notification.
    pub async fn install_seat(
        &self,
        scope_type: ScopeType,
        scope_id: Uuid,
        new_user_id: UserId,
        installed_by: UserId,
    ) -> AppResult<SeatInstallation> {
        let seat_role = Self::seat_role_for(scope_type)?;
        let scope = RoleScope::new(scope_type, Some(scope_id))?;
        self.scope_validator.validate(&scope).await?;

        if !self.users.user_exists(new_user_id).await? {
            return Err(AppError::NotFound(format!(
                "user '{new_user_id}' was not found"
            )));
        }

        let role = self.require_seeded_role(seat_role).await?;
        let installation = self
            .seats
            .replace_holder(&role, &scope, new_user_id, installed_by)
            .await?;

        let mut affected = vec![new_user_id];
        if let Some(replaced) = installation.replaced_user
            && replaced != new_user_id
        {
            affected.push(replaced);
        }
        self.contexts.invalidate_many(&affected).await?;

        Ok(installation)
    }

    /// Removes a user from the exclusive seat of a scope.
    ///
    /// When the revocation would leave the user with zero live roles, the
    /// baseline `employee` company assignment is auto-created in the same
    /// transaction: callers must never leave a user role-less.
    pub async fn vacate_seat(
        &self,
        scope_type: ScopeType,
        scope_id: Uuid,
        user_id: UserId,
        vacated_by: UserId,
    ) -> AppResult<SeatVacancy> {
        let seat_role = Self::seat_role_for(scope_type)?;
        let scope = RoleScope::new(scope_type, Some(scope_id))?;

        let role = self.require_seeded_role(seat_role).await?;
        let baseline = self.require_seeded_role(RoleName::baseline()).await?;

        let vacancy = self
            .seats
            .vacate_holder(&role, &scope, user_id, vacated_by, &baseline)
            .await?;

        self.contexts.invalidate(user_id).await?;

        Ok(vacancy)
    }

    /// Routes one role to many users, dispatching seat roles through seat
    /// installation and everything else through ordinary assignment.
    ///
    /// The path is chosen by the role's name. Each user is processed
    /// independently; one user's failure does not block the others.
    pub async fn route_assignment(
        &self,
        user_ids: &[UserId],
        role_id: RoleId,
        assigned_by: UserId,
        routing: AssignmentRouting,
    ) -> AppResult<RoutedAssignments> {
        let role = self
            .catalog
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        let seat_scope = role.canonical_name().and_then(|name| name.seat_scope());

        let mut results = Vec::with_capacity(user_ids.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for &user_id in user_ids {
            let result = match seat_scope {
                Some(scope_type) => match routing.context_id_for(scope_type) {
                    Some(scope_id) => self
                        .install_seat(scope_type, scope_id, user_id, assigned_by)
                        .await
                        .map(|installation| RoutedOutcome {
                            assignment: installation.assignment,
                            replaced_user: installation.replaced_user,
                        }),
                    None => Err(AppError::Validation(format!(
                        "assigning '{}' requires a {scope_type} context id",
                        role.name
                    ))),
                },
                None => self
                    .assignments
                    .assign(user_id, role_id, routing.derived_scope(), assigned_by)
                    .await
                    .map(|assignment| RoutedOutcome {
                        assignment,
                        replaced_user: None,
                    }),
            };

            if result.is_ok() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            results.push(RoutedAssignment { user_id, result });
        }

        Ok(RoutedAssignments {
            results,
            succeeded,
            failed,
        })
    }

    fn seat_role_for(scope_type: ScopeType) -> AppResult<RoleName> {
        RoleName::seat_for_scope(scope_type).ok_or_else(|| {
            AppError::Validation(format!("scope type '{scope_type}' has no exclusive seat"))
        })
    }

    async fn require_seeded_role(&self, role_name: RoleName) -> AppResult<RoleRecord> {
        self.catalog
            .find_role_by_name(role_name.as_str())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role_name}' is not seeded in the role catalog"
                ))
            })
    }
}
