//! Redis-backed role context cache.

use async_trait::async_trait;
use redis::AsyncCommands;

use crewdesk_application::RoleContextCache;
use crewdesk_core::{AppError, AppResult, UserId};
use crewdesk_domain::RoleContext;

/// Redis implementation of the role context cache port.
///
/// Entries are JSON-encoded projections under `user:roles:{user_id}` keys
/// with a bounded time-to-live. Connection and command failures surface as
/// unavailability, which the read path downgrades to a cache miss.
#[derive(Clone)]
pub struct RedisRoleContextCache {
    client: redis::Client,
}

impl RedisRoleContextCache {
    /// Creates a cache adapter with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key_for(user_id: UserId) -> String {
        format!("user:roles:{user_id}")
    }
}

#[async_trait]
impl RoleContextCache for RedisRoleContextCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<RoleContext>> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to connect to redis: {error}"))
            })?;

        let encoded: Option<String> = connection
            .get(Self::key_for(user_id))
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to read role context cache entry: {error}"))
            })?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str(value).map_err(|error| {
                    AppError::Internal(format!("invalid cached role context: {error}"))
                })
            })
            .transpose()
    }

    async fn set(&self, context: &RoleContext, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let value = serde_json::to_string(context).map_err(|error| {
            AppError::Internal(format!("failed to encode role context: {error}"))
        })?;
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to connect to redis: {error}"))
            })?;

        connection
            .set_ex(
                Self::key_for(context.user_id),
                value,
                u64::from(ttl_seconds),
            )
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to write role context cache entry: {error}"
                ))
            })
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to connect to redis: {error}"))
            })?;

        connection
            .del(Self::key_for(user_id))
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to delete role context cache entry: {error}"
                ))
            })
    }
}
