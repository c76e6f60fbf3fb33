use std::sync::Arc;

use chrono::Utc;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::{RoleContext, RoleMembership};
use tracing::warn;

use crate::{RoleAssignmentRepository, RoleContextCache, ScopeDirectory};

/// Default time-to-live for cached role contexts, in seconds.
pub const DEFAULT_ROLE_CONTEXT_TTL_SECONDS: u32 = 300;

/// Cache-aside read path over a user's scoped role memberships.
///
/// Reads tolerate staleness up to the TTL; every write path that changes a
/// user's live assignments must invalidate here before reporting success.
#[derive(Clone)]
pub struct RoleContextService {
    assignments: Arc<dyn RoleAssignmentRepository>,
    scopes: Arc<dyn ScopeDirectory>,
    cache: Arc<dyn RoleContextCache>,
    ttl_seconds: u32,
}

impl RoleContextService {
    /// Creates the service with the default cache TTL.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn RoleAssignmentRepository>,
        scopes: Arc<dyn ScopeDirectory>,
        cache: Arc<dyn RoleContextCache>,
    ) -> Self {
        Self::with_ttl(assignments, scopes, cache, DEFAULT_ROLE_CONTEXT_TTL_SECONDS)
    }

    /// Creates the service with an explicit cache TTL in seconds.
    #[must_use]
    pub fn with_ttl(
        assignments: Arc<dyn RoleAssignmentRepository>,
        scopes: Arc<dyn ScopeDirectory>,
        cache: Arc<dyn RoleContextCache>,
        ttl_seconds: u32,
    ) -> Self {
        Self {
            assignments,
            scopes,
            cache,
            ttl_seconds,
        }
    }

    /// Returns the user's role context, reading through the cache.
    ///
    /// Cache read failures are treated as misses; cache write failures are
    /// logged and swallowed. The freshly computed projection is always
    /// returned to the caller.
    pub async fn get_user_role_context(&self, user_id: UserId) -> AppResult<RoleContext> {
        match self.cache.get(user_id).await {
            Ok(Some(context)) => return Ok(context),
            Ok(None) => {}
            Err(error) => {
                warn!(%user_id, %error, "role context cache read failed; treating as a miss");
            }
        }

        let context = self.load_context(user_id).await?;

        if self.ttl_seconds > 0
            && let Err(error) = self.cache.set(&context, self.ttl_seconds).await
        {
            warn!(%user_id, %error, "role context cache write failed; returning uncached projection");
        }

        Ok(context)
    }

    /// Deletes the cached projection for one user.
    ///
    /// Unlike cache reads, a failure here is a real error: a stale entry
    /// after a committed write is a correctness risk.
    pub async fn invalidate(&self, user_id: UserId) -> AppResult<()> {
        self.cache.delete(user_id).await
    }

    /// Deletes the cached projections for several users.
    ///
    /// Each deletion proceeds independently; the first failure is reported
    /// after all entries have been attempted.
    pub async fn invalidate_many(&self, user_ids: &[UserId]) -> AppResult<()> {
        let mut first_error = None;

        for &user_id in user_ids {
            if let Err(error) = self.cache.delete(user_id).await {
                warn!(%user_id, %error, "role context invalidation failed");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn load_context(&self, user_id: UserId) -> AppResult<RoleContext> {
        let assignments = self.assignments.list_live_by_user(user_id).await?;

        let mut memberships = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let scope_name = if assignment.scope.is_company() {
                None
            } else {
                // Best effort: a failed name lookup must not fail the read.
                match self.scopes.scope_name(&assignment.scope).await {
                    Ok(name) => name,
                    Err(error) => {
                        warn!(
                            %user_id,
                            scope = %assignment.scope,
                            %error,
                            "scope name lookup failed; leaving name unresolved"
                        );
                        None
                    }
                }
            };

            memberships.push(RoleMembership {
                role_name: assignment.role_name,
                scope: assignment.scope,
                scope_name,
                assigned_at: assignment.assigned_at,
            });
        }

        Ok(RoleContext::from_memberships(user_id, memberships, Utc::now()))
    }
}
