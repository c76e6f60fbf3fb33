use async_trait::async_trait;
use crewdesk_core::{AppResult, UserId};
use crewdesk_domain::{RoleAssignment, RoleRecord, RoleScope};

/// Outcome of installing a new holder into an exclusive seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatInstallation {
    /// The newly created live assignment.
    pub assignment: RoleAssignment,
    /// The user whose assignment was revoked to make room, if any.
    pub replaced_user: Option<UserId>,
}

/// Outcome of vacating an exclusive seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatVacancy {
    /// The revoked seat assignment.
    pub revoked: RoleAssignment,
    /// The user's remaining live assignments after the revocation.
    pub remaining_roles: Vec<RoleAssignment>,
    /// True when the baseline assignment was auto-created because no live
    /// assignments remained.
    pub baseline_assigned: bool,
}

/// Transactional port enforcing the single-holder invariant for seat roles.
///
/// Both operations run as one atomic transaction against the store,
/// including the audit entry they append; concurrent calls for the same
/// scope serialize through the store's row-level locking. A failure rolls
/// back every write in the call.
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// Revokes the current live holder of the seat, if any, and installs the
    /// new holder.
    async fn replace_holder(
        &self,
        role: &RoleRecord,
        scope: &RoleScope,
        new_user_id: UserId,
        installed_by: UserId,
    ) -> AppResult<SeatInstallation>;

    /// Revokes the user's live seat assignment and auto-creates the baseline
    /// assignment when no live assignments remain.
    ///
    /// Fails with not-found when the user does not currently hold the seat.
    async fn vacate_holder(
        &self,
        role: &RoleRecord,
        scope: &RoleScope,
        user_id: UserId,
        vacated_by: UserId,
        baseline_role: &RoleRecord,
    ) -> AppResult<SeatVacancy>;
}
