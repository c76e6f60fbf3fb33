use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::{RoleAssignment, RoleId, RoleScope};

/// Insert payload for one role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    /// Target user.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Role name resolved from the catalog, denormalized onto the row.
    pub role_name: String,
    /// Scope the role is granted within.
    pub scope: RoleScope,
    /// User creating the assignment.
    pub assigned_by: UserId,
}

/// One live holder of a role within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleHolder {
    /// Holding user.
    pub user_id: UserId,
    /// When the role was assigned.
    pub assigned_at: DateTime<Utc>,
}

/// Repository port over the role-assignment records.
///
/// All reads see live rows only; revocation is a soft delete and history
/// stays in the store.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Inserts one assignment.
    ///
    /// Fails with a conflict when a live duplicate already exists for the
    /// same user, role and scope.
    async fn insert(&self, assignment: NewAssignment) -> AppResult<RoleAssignment>;

    /// Soft-revokes the live assignment for the key, returning the revoked
    /// row. Fails with not-found when no live assignment matches.
    async fn revoke(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: &RoleScope,
        revoked_by: UserId,
    ) -> AppResult<RoleAssignment>;

    /// Finds the live assignment for the key, if any.
    async fn find_live(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: &RoleScope,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists a user's live assignments, ordered by scope then recency.
    async fn list_live_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists a user's live assignments within one scope.
    async fn list_live_by_scope(
        &self,
        user_id: UserId,
        scope: &RoleScope,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Lists the live holders of a role within one scope.
    async fn list_live_holders(
        &self,
        role_name: &str,
        scope: &RoleScope,
    ) -> AppResult<Vec<RoleHolder>>;
}
