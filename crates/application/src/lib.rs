//! Application services and ports for the scoped role-authorization core.

#![forbid(unsafe_code)]

mod access_ports;
mod authorization_context;
mod permission_gate;
mod role_assignment_service;
mod role_context_service;
mod scope_validator;
mod seat_service;

pub use access_ports::{
    AuditEvent, AuditRepository, NewAssignment, RoleAssignmentRepository, RoleCatalog,
    RoleContextCache, RoleHolder, ScopeDirectory, SeatInstallation, SeatRepository, SeatVacancy,
    UserDirectory, UserRecord,
};
pub use authorization_context::{AuthorizationContext, AuthorizationService};
pub use permission_gate::{PermissionCheckMode, PermissionGate, PermissionRequirement};
pub use role_assignment_service::{BulkAssignmentOutcome, RoleAssignmentService};
pub use role_context_service::{DEFAULT_ROLE_CONTEXT_TTL_SECONDS, RoleContextService};
pub use scope_validator::ScopeValidator;
pub use seat_service::{
    AssignmentRouting, RoutedAssignment, RoutedAssignments, RoutedOutcome, SeatService,
};
