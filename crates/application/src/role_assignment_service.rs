use std::sync::Arc;

use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::{AssignmentRequest, AuditAction, RoleAssignment, RoleId, RoleScope};

use crate::{
    AuditEvent, AuditRepository, NewAssignment, RoleAssignmentRepository, RoleCatalog,
    RoleContextService, RoleHolder, ScopeValidator, UserDirectory,
};

/// Per-item result of a bulk assignment call.
///
/// Bulk application is not transactional: one item's failure leaves the
/// others applied.
#[derive(Debug)]
pub struct BulkAssignmentOutcome {
    /// The originating request item.
    pub request: AssignmentRequest,
    /// The item's own success or failure.
    pub result: AppResult<RoleAssignment>,
}

/// Application service over the role-assignment records.
///
/// Plain assignment does not enforce seat exclusivity; the seat service
/// layers that on for the three exclusive roles.
#[derive(Clone)]
pub struct RoleAssignmentService {
    assignments: Arc<dyn RoleAssignmentRepository>,
    catalog: Arc<dyn RoleCatalog>,
    users: Arc<dyn UserDirectory>,
    scope_validator: ScopeValidator,
    contexts: RoleContextService,
    audit: Arc<dyn AuditRepository>,
}

impl RoleAssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn RoleAssignmentRepository>,
        catalog: Arc<dyn RoleCatalog>,
        users: Arc<dyn UserDirectory>,
        scope_validator: ScopeValidator,
        contexts: RoleContextService,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            assignments,
            catalog,
            users,
            scope_validator,
            contexts,
            audit,
        }
    }

    /// Assigns a role to a user within a scope.
    ///
    /// Validates the scope entity, role and user, rejects live duplicates,
    /// then inserts, audits and invalidates the user's cached role context.
    pub async fn assign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: RoleScope,
        assigned_by: UserId,
    ) -> AppResult<RoleAssignment> {
        self.scope_validator.validate(&scope).await?;

        let role = self
            .catalog
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if !self.users.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        if self
            .assignments
            .find_live(user_id, role_id, &scope)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' already holds role '{}' in {scope}",
                role.name
            )));
        }

        let assignment = self
            .assignments
            .insert(NewAssignment {
                user_id,
                role_id,
                role_name: role.name,
                scope,
                assigned_by,
            })
            .await?;

        self.append_assignment_event(&assignment, AuditAction::RoleAssigned, assigned_by)
            .await?;
        self.contexts.invalidate(user_id).await?;

        Ok(assignment)
    }

    /// Soft-revokes a live assignment.
    pub async fn revoke(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: RoleScope,
        revoked_by: UserId,
    ) -> AppResult<RoleAssignment> {
        let assignment = self
            .assignments
            .revoke(user_id, role_id, &scope, revoked_by)
            .await?;

        self.append_assignment_event(&assignment, AuditAction::RoleRevoked, revoked_by)
            .await?;
        self.contexts.invalidate(user_id).await?;

        Ok(assignment)
    }

    /// Lists a user's live assignments, ordered by scope then recency.
    pub async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        self.assignments.list_live_by_user(user_id).await
    }

    /// Lists a user's live assignments within one scope.
    pub async fn list_by_scope(
        &self,
        user_id: UserId,
        scope: RoleScope,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.assignments.list_live_by_scope(user_id, &scope).await
    }

    /// Lists the live holders of a role within one scope.
    pub async fn list_holders_of_role(
        &self,
        role_name: &str,
        scope: RoleScope,
    ) -> AppResult<Vec<RoleHolder>> {
        self.assignments.list_live_holders(role_name, &scope).await
    }

    /// Applies each assignment request independently.
    ///
    /// The call itself never fails because one item failed; callers receive
    /// a per-item result list.
    pub async fn bulk_assign(
        &self,
        requests: Vec<AssignmentRequest>,
        assigned_by: UserId,
    ) -> Vec<BulkAssignmentOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self
                .assign(request.user_id, request.role_id, request.scope, assigned_by)
                .await;
            outcomes.push(BulkAssignmentOutcome { request, result });
        }

        outcomes
    }

    async fn append_assignment_event(
        &self,
        assignment: &RoleAssignment,
        action: AuditAction,
        causer_id: UserId,
    ) -> AppResult<()> {
        let verb = match action {
            AuditAction::RoleAssigned => "assigned",
            AuditAction::RoleRevoked => "revoked",
        };

        self.audit
            .append_event(AuditEvent {
                action,
                subject_type: "role_assignment".to_owned(),
                subject_id: assignment.id.to_string(),
                causer_id: Some(causer_id),
                description: format!(
                    "{verb} role '{}' for user '{}' in {}",
                    assignment.role_name, assignment.user_id, assignment.scope
                ),
                properties: serde_json::json!({
                    "user_id": assignment.user_id,
                    "role": assignment.role_name,
                    "scope_type": assignment.scope.kind().as_str(),
                    "scope_id": assignment.scope.entity_id(),
                }),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use crewdesk_core::{AppError, AppResult, UserId};
    use crewdesk_domain::{
        AssignmentRequest, RoleAssignment, RoleId, RoleRecord, RoleScope,
    };
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::RoleAssignmentService;
    use crate::{
        AuditEvent, AuditRepository, NewAssignment, RoleAssignmentRepository, RoleCatalog,
        RoleContextCache, RoleContextService, RoleHolder, ScopeDirectory, ScopeValidator,
        UserDirectory, UserRecord,
    };

    #[derive(Default)]
    struct FakeAssignmentRepository {
        rows: Mutex<Vec<RoleAssignment>>,
    }

    #[async_trait]
    impl RoleAssignmentRepository for FakeAssignmentRepository {
        async fn insert(&self, assignment: NewAssignment) -> AppResult<RoleAssignment> {
            let mut rows = self.rows.lock().await;
            let duplicate = rows.iter().any(|row| {
                row.is_live()
                    && row.user_id == assignment.user_id
                    && row.role_id == assignment.role_id
                    && row.scope == assignment.scope
            });
            if duplicate {
                return Err(AppError::Conflict("duplicate live assignment".to_owned()));
            }

            let row = RoleAssignment {
                id: Uuid::new_v4(),
                user_id: assignment.user_id,
                role_id: assignment.role_id,
                role_name: assignment.role_name,
                scope: assignment.scope,
                assigned_by: Some(assignment.assigned_by),
                assigned_at: Utc::now(),
                revoked_at: None,
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn revoke(
            &self,
            user_id: UserId,
            role_id: RoleId,
            scope: &RoleScope,
            _revoked_by: UserId,
        ) -> AppResult<RoleAssignment> {
            let mut rows = self.rows.lock().await;
            let row = rows.iter_mut().find(|row| {
                row.is_live()
                    && row.user_id == user_id
                    && row.role_id == role_id
                    && row.scope == *scope
            });

            match row {
                Some(row) => {
                    row.revoked_at = Some(Utc::now());
                    Ok(row.clone())
                }
                None => Err(AppError::NotFound(
                    "live role assignment was not found".to_owned(),
                )),
            }
        }

        async fn find_live(
            &self,
            user_id: UserId,
            role_id: RoleId,
            scope: &RoleScope,
        ) -> AppResult<Option<RoleAssignment>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .find(|row| {
                    row.is_live()
                        && row.user_id == user_id
                        && row.role_id == role_id
                        && row.scope == *scope
                })
                .cloned())
        }

        async fn list_live_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| row.is_live() && row.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn list_live_by_scope(
            &self,
            user_id: UserId,
            scope: &RoleScope,
        ) -> AppResult<Vec<RoleAssignment>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| row.is_live() && row.user_id == user_id && row.scope == *scope)
                .cloned()
                .collect())
        }

        async fn list_live_holders(
            &self,
            role_name: &str,
            scope: &RoleScope,
        ) -> AppResult<Vec<RoleHolder>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| row.is_live() && row.role_name == role_name && row.scope == *scope)
                .map(|row| RoleHolder {
                    user_id: row.user_id,
                    assigned_at: row.assigned_at,
                })
                .collect())
        }
    }

    struct FakeCatalog {
        roles: Vec<RoleRecord>,
    }

    #[async_trait]
    impl RoleCatalog for FakeCatalog {
        async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>> {
            Ok(self.roles.iter().find(|role| role.id == role_id).cloned())
        }

        async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>> {
            Ok(self.roles.iter().find(|role| role.name == name).cloned())
        }

        async fn list_permission_names_for_user(
            &self,
            _user_id: UserId,
        ) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct FakeUserDirectory {
        known: HashSet<UserId>,
    }

    #[async_trait]
    impl UserDirectory for FakeUserDirectory {
        async fn user_exists(&self, user_id: UserId) -> AppResult<bool> {
            Ok(self.known.contains(&user_id))
        }

        async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self.known.contains(&user_id).then(|| UserRecord {
                user_id,
                display_name: user_id.to_string(),
                email: None,
            }))
        }
    }

    struct FakeScopeDirectory {
        live: HashSet<RoleScope>,
    }

    #[async_trait]
    impl ScopeDirectory for FakeScopeDirectory {
        async fn scope_exists(&self, scope: &RoleScope) -> AppResult<bool> {
            Ok(self.live.contains(scope))
        }

        async fn scope_name(&self, scope: &RoleScope) -> AppResult<Option<String>> {
            Ok(self.live.contains(scope).then(|| scope.to_string()))
        }
    }

    #[derive(Default)]
    struct FakeCache {
        deletes: Mutex<Vec<UserId>>,
    }

    #[async_trait]
    impl RoleContextCache for FakeCache {
        async fn get(
            &self,
            _user_id: UserId,
        ) -> AppResult<Option<crewdesk_domain::RoleContext>> {
            Ok(None)
        }

        async fn set(
            &self,
            _context: &crewdesk_domain::RoleContext,
            _ttl_seconds: u32,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, user_id: UserId) -> AppResult<()> {
            self.deletes.lock().await.push(user_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    struct Harness {
        service: RoleAssignmentService,
        repository: Arc<FakeAssignmentRepository>,
        cache: Arc<FakeCache>,
        audit: Arc<FakeAuditRepository>,
    }

    fn harness(
        roles: Vec<RoleRecord>,
        users: HashSet<UserId>,
        scopes: HashSet<RoleScope>,
    ) -> Harness {
        let repository = Arc::new(FakeAssignmentRepository::default());
        let cache = Arc::new(FakeCache::default());
        let audit = Arc::new(FakeAuditRepository::default());
        let scope_directory = Arc::new(FakeScopeDirectory { live: scopes });
        let contexts = RoleContextService::new(
            repository.clone(),
            scope_directory.clone(),
            cache.clone(),
        );
        let service = RoleAssignmentService::new(
            repository.clone(),
            Arc::new(FakeCatalog { roles }),
            Arc::new(FakeUserDirectory { known: users }),
            ScopeValidator::new(scope_directory),
            contexts,
            audit.clone(),
        );

        Harness {
            service,
            repository,
            cache,
            audit,
        }
    }

    fn role(name: &str) -> RoleRecord {
        RoleRecord {
            id: RoleId::new(),
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn assign_rejects_unknown_role() {
        let user = UserId::new();
        let harness = harness(Vec::new(), HashSet::from([user]), HashSet::new());

        let result = harness
            .service
            .assign(user, RoleId::new(), RoleScope::Company, UserId::new())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn assign_rejects_unknown_user() {
        let employee = role("employee");
        let role_id = employee.id;
        let harness = harness(vec![employee], HashSet::new(), HashSet::new());

        let result = harness
            .service
            .assign(UserId::new(), role_id, RoleScope::Company, UserId::new())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_assign_is_a_conflict() {
        let user = UserId::new();
        let actor = UserId::new();
        let employee = role("employee");
        let role_id = employee.id;
        let harness = harness(
            vec![employee],
            HashSet::from([user, actor]),
            HashSet::new(),
        );

        let first = harness
            .service
            .assign(user, role_id, RoleScope::Company, actor)
            .await;
        assert!(first.is_ok());

        let second = harness
            .service
            .assign(user, role_id, RoleScope::Company, actor)
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn assign_audits_and_invalidates() {
        let user = UserId::new();
        let actor = UserId::new();
        let team = Uuid::new_v4();
        let hr = role("hr_manager");
        let role_id = hr.id;
        let harness = harness(
            vec![hr],
            HashSet::from([user, actor]),
            HashSet::from([RoleScope::Team(team)]),
        );

        let result = harness
            .service
            .assign(user, role_id, RoleScope::Team(team), actor)
            .await;

        assert!(result.is_ok());
        assert_eq!(harness.audit.events.lock().await.len(), 1);
        assert_eq!(harness.cache.deletes.lock().await.as_slice(), &[user]);
    }

    #[tokio::test]
    async fn assign_then_revoke_restores_the_prior_live_role_set() {
        let user = UserId::new();
        let actor = UserId::new();
        let division = Uuid::new_v4();
        let head = role("division_head");
        let role_id = head.id;
        let harness = harness(
            vec![head],
            HashSet::from([user, actor]),
            HashSet::from([RoleScope::Division(division)]),
        );

        let before = harness.service.list_by_user(user).await;
        assert!(before.as_ref().is_ok_and(Vec::is_empty));

        let assigned = harness
            .service
            .assign(user, role_id, RoleScope::Division(division), actor)
            .await;
        assert!(assigned.is_ok());

        let revoked = harness
            .service
            .revoke(user, role_id, RoleScope::Division(division), actor)
            .await;
        assert!(revoked.is_ok());

        let after = harness.service.list_by_user(user).await;
        assert!(after.as_ref().is_ok_and(Vec::is_empty));

        // History stays queryable: the row is soft-revoked, not deleted.
        let rows = harness.repository.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].revoked_at.is_some());
    }

    #[tokio::test]
    async fn revoke_without_live_assignment_is_not_found() {
        let user = UserId::new();
        let harness = harness(Vec::new(), HashSet::from([user]), HashSet::new());

        let result = harness
            .service
            .revoke(user, RoleId::new(), RoleScope::Company, UserId::new())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn bulk_assign_isolates_per_item_failures() {
        let first = UserId::new();
        let second = UserId::new();
        let third = UserId::new();
        let actor = UserId::new();
        let employee = role("employee");
        let role_id = employee.id;
        let harness = harness(
            vec![employee],
            HashSet::from([first, second, third, actor]),
            HashSet::new(),
        );

        let requests = vec![
            AssignmentRequest {
                user_id: first,
                role_id,
                scope: RoleScope::Company,
            },
            AssignmentRequest {
                user_id: second,
                // Unknown role: this item alone fails.
                role_id: RoleId::new(),
                scope: RoleScope::Company,
            },
            AssignmentRequest {
                user_id: third,
                role_id,
                scope: RoleScope::Company,
            },
        ];

        let outcomes = harness.service.bulk_assign(requests, actor).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(AppError::NotFound(_))));
        assert!(outcomes[2].result.is_ok());
    }
}
