use std::collections::HashSet;
use std::sync::Arc;

use crewdesk_core::{AppError, AppResult, UserId};
use tracing::warn;

use crate::RoleCatalog;

/// How a set of required permission names combines into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheckMode {
    /// The single named permission must be granted.
    Single,
    /// At least one of the named permissions must be granted.
    Any,
    /// Every named permission must be granted.
    All,
}

/// Declared permission requirement of one protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    names: Vec<String>,
    mode: PermissionCheckMode,
}

impl PermissionRequirement {
    /// Requires one permission.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            mode: PermissionCheckMode::Single,
        }
    }

    /// Requires at least one of the permissions.
    #[must_use]
    pub fn any_of(names: Vec<String>) -> Self {
        Self {
            names,
            mode: PermissionCheckMode::Any,
        }
    }

    /// Requires all of the permissions.
    #[must_use]
    pub fn all_of(names: Vec<String>) -> Self {
        Self {
            names,
            mode: PermissionCheckMode::All,
        }
    }

    /// Returns the required permission names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the combination mode.
    #[must_use]
    pub fn mode(&self) -> PermissionCheckMode {
        self.mode
    }
}

/// Permission-name based access-control layer.
///
/// Operations without a declared requirement — or without an authenticated
/// user — are open by default; call sites opt out of that policy by always
/// declaring a requirement.
#[derive(Clone)]
pub struct PermissionGate {
    catalog: Arc<dyn RoleCatalog>,
}

impl PermissionGate {
    /// Creates a gate over the role catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn RoleCatalog>) -> Self {
        Self { catalog }
    }

    /// Returns whether the requirement is satisfied for the user.
    ///
    /// Resolves the union of permission names reachable through all of the
    /// user's live role assignments.
    pub async fn allows(
        &self,
        user_id: Option<UserId>,
        requirement: Option<&PermissionRequirement>,
    ) -> AppResult<bool> {
        let (Some(user_id), Some(requirement)) = (user_id, requirement) else {
            return Ok(true);
        };

        if requirement.names.is_empty() {
            return Ok(true);
        }

        let granted = self
            .catalog
            .list_permission_names_for_user(user_id)
            .await?;
        let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();

        let allowed = match requirement.mode {
            PermissionCheckMode::Single | PermissionCheckMode::Any => requirement
                .names
                .iter()
                .any(|name| granted.contains(name.as_str())),
            PermissionCheckMode::All => requirement
                .names
                .iter()
                .all(|name| granted.contains(name.as_str())),
        };

        if !allowed {
            let missing: Vec<&str> = requirement
                .names
                .iter()
                .map(String::as_str)
                .filter(|name| !granted.contains(name))
                .collect();
            warn!(%user_id, ?missing, "permission check failed");
        }

        Ok(allowed)
    }

    /// Ensures the requirement is satisfied for the user.
    ///
    /// The denial carries no detail about which permission was missing; the
    /// specifics are logged instead.
    pub async fn check(
        &self,
        user_id: Option<UserId>,
        requirement: Option<&PermissionRequirement>,
    ) -> AppResult<()> {
        if self.allows(user_id, requirement).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(
            "missing required permission".to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use crewdesk_core::{AppError, AppResult, UserId};
    use crewdesk_domain::{RoleId, RoleRecord};

    use super::{PermissionGate, PermissionRequirement};
    use crate::RoleCatalog;

    struct FakeCatalog {
        grants: HashMap<UserId, Vec<String>>,
    }

    #[async_trait]
    impl RoleCatalog for FakeCatalog {
        async fn find_role_by_id(&self, _role_id: RoleId) -> AppResult<Option<RoleRecord>> {
            Ok(None)
        }

        async fn find_role_by_name(&self, _name: &str) -> AppResult<Option<RoleRecord>> {
            Ok(None)
        }

        async fn list_permission_names_for_user(
            &self,
            user_id: UserId,
        ) -> AppResult<Vec<String>> {
            Ok(self.grants.get(&user_id).cloned().unwrap_or_default())
        }
    }

    fn gate(user_id: UserId, granted: &[&str]) -> PermissionGate {
        PermissionGate::new(Arc::new(FakeCatalog {
            grants: HashMap::from([(
                user_id,
                granted.iter().map(|name| (*name).to_owned()).collect(),
            )]),
        }))
    }

    #[tokio::test]
    async fn single_permission_must_be_granted() {
        let user = UserId::new();
        let gate = gate(user, &["timesheet.read"]);

        let requirement = PermissionRequirement::single("timesheet.read");
        let allowed = gate.allows(Some(user), Some(&requirement)).await;
        assert!(allowed.is_ok_and(|value| value));

        let requirement = PermissionRequirement::single("timesheet.approve");
        let result = gate.check(Some(user), Some(&requirement)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn any_mode_needs_a_non_empty_intersection() {
        let user = UserId::new();
        let gate = gate(user, &["news.read"]);

        let requirement = PermissionRequirement::any_of(vec![
            "news.publish".to_owned(),
            "news.read".to_owned(),
        ]);
        let allowed = gate.allows(Some(user), Some(&requirement)).await;
        assert!(allowed.is_ok_and(|value| value));
    }

    #[tokio::test]
    async fn all_mode_needs_every_permission() {
        let user = UserId::new();
        let gate = gate(user, &["news.read", "news.publish"]);

        let requirement = PermissionRequirement::all_of(vec![
            "news.read".to_owned(),
            "news.publish".to_owned(),
        ]);
        let allowed = gate.allows(Some(user), Some(&requirement)).await;
        assert!(allowed.is_ok_and(|value| value));

        let requirement = PermissionRequirement::all_of(vec![
            "news.read".to_owned(),
            "news.delete".to_owned(),
        ]);
        let allowed = gate.allows(Some(user), Some(&requirement)).await;
        assert!(allowed.is_ok_and(|value| !value));
    }

    #[tokio::test]
    async fn undeclared_requirements_are_open_by_default() {
        let user = UserId::new();
        let gate = gate(user, &[]);

        let no_requirement = gate.allows(Some(user), None).await;
        assert!(no_requirement.is_ok_and(|value| value));

        let no_user = gate
            .allows(None, Some(&PermissionRequirement::single("anything")))
            .await;
        assert!(no_user.is_ok_and(|value| value));
    }

    #[tokio::test]
    async fn denial_message_does_not_leak_the_missing_permission() {
        let user = UserId::new();
        let gate = gate(user, &[]);

        let requirement = PermissionRequirement::single("security.role.manage");
        let result = gate.check(Some(user), Some(&requirement)).await;

        let Err(AppError::Forbidden(message)) = result else {
            panic!("expected a forbidden error");
        };
        assert!(!message.contains("security.role.manage"));
    }
}
