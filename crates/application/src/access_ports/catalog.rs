use async_trait::async_trait;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::{RoleId, RoleRecord};

/// Repository port over role definitions and the role-permission link.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    /// Finds a live role by id.
    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>>;

    /// Finds a live role by its unique name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<RoleRecord>>;

    /// Resolves the union of permission names reachable through all of a
    /// user's live role assignments.
    async fn list_permission_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>>;
}
