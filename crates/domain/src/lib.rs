//! Domain entities and invariants for the scoped role-authorization core.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod context;
mod role;
mod scope;

pub use assignment::{AssignmentRequest, RoleAssignment};
pub use audit::AuditAction;
pub use context::{HighestRoleIndex, RoleContext, RoleMembership};
pub use role::{RoleId, RoleName, RoleRecord, role_level};
pub use scope::{RoleScope, ScopeType};
