use async_trait::async_trait;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::RoleScope;

/// One live user record from the wider back office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Email, when one is on file.
    pub email: Option<String>,
}

/// Read-only lookup port over user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns true when a live user record exists for the id.
    async fn user_exists(&self, user_id: UserId) -> AppResult<bool>;

    /// Finds a live user record by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;
}

/// Read-only lookup port over the scope-entity tables (divisions, teams,
/// projects).
#[async_trait]
pub trait ScopeDirectory: Send + Sync {
    /// Returns true when a live scope-entity record exists for the scope.
    ///
    /// The company scope always exists.
    async fn scope_exists(&self, scope: &RoleScope) -> AppResult<bool>;

    /// Returns the human-readable name of the scope entity, if it exists.
    async fn scope_name(&self, scope: &RoleScope) -> AppResult<Option<String>>;
}
