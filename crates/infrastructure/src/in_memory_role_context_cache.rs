use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crewdesk_application::RoleContextCache;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::RoleContext;

#[derive(Debug, Clone)]
struct CacheEntry {
    context: RoleContext,
    expires_at: Instant,
}

/// In-memory cache adapter for role contexts.
///
/// Suited to tests and single-process deployments without Redis.
#[derive(Default)]
pub struct InMemoryRoleContextCache {
    entries: RwLock<HashMap<UserId, CacheEntry>>,
}

impl InMemoryRoleContextCache {
    /// Creates an empty in-memory role context cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleContextCache for InMemoryRoleContextCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<RoleContext>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user_id) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.context.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&user_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&user_id);
        }

        Ok(None)
    }

    async fn set(&self, context: &RoleContext, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            context.user_id,
            CacheEntry {
                context: context.clone(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }
}
