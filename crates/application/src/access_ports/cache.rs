use async_trait::async_trait;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::RoleContext;

/// Cache port for materialized role contexts.
///
/// Caching is a performance optimization, never a correctness dependency:
/// callers treat read failures as misses and may swallow write failures.
/// Deletion failures matter, because a stale entry after a write is a
/// correctness risk.
#[async_trait]
pub trait RoleContextCache: Send + Sync {
    /// Returns the cached projection for one user, if present.
    async fn get(&self, user_id: UserId) -> AppResult<Option<RoleContext>>;

    /// Stores a projection with a bounded time-to-live.
    async fn set(&self, context: &RoleContext, ttl_seconds: u32) -> AppResult<()>;

    /// Deletes the cached projection for one user.
    async fn delete(&self, user_id: UserId) -> AppResult<()>;
}
