use async_trait::async_trait;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::AuditAction;

/// Immutable audit event payload appended by role-assignment writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Affected record kind label.
    pub subject_type: String,
    /// Affected record identifier.
    pub subject_id: String,
    /// Acting user, when known.
    pub causer_id: Option<UserId>,
    /// Human-readable event description.
    pub description: String,
    /// Structured event payload.
    pub properties: serde_json::Value,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
