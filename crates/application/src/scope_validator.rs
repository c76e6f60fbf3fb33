use std::sync::Arc;

use crewdesk_core::{AppError, AppResult};
use crewdesk_domain::RoleScope;

use crate::ScopeDirectory;

/// Confirms a scope value refers to an existing, non-deleted organizational
/// entity.
#[derive(Clone)]
pub struct ScopeValidator {
    scopes: Arc<dyn ScopeDirectory>,
}

impl ScopeValidator {
    /// Creates a validator over a scope-entity lookup port.
    #[must_use]
    pub fn new(scopes: Arc<dyn ScopeDirectory>) -> Self {
        Self { scopes }
    }

    /// Validates that the scope resolves to a live entity.
    ///
    /// The company scope always validates; the shape of a scope (id present
    /// or absent) is already enforced by [`RoleScope::new`].
    pub async fn validate(&self, scope: &RoleScope) -> AppResult<()> {
        if scope.is_company() {
            return Ok(());
        }

        if self.scopes.scope_exists(scope).await? {
            return Ok(());
        }

        Err(AppError::NotFound(format!("{scope} was not found")))
    }
}
