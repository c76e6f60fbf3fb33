//! Ports consumed by the access-control services.

mod assignments;
mod audit;
mod cache;
mod catalog;
mod directory;
mod seats;

pub use assignments::{NewAssignment, RoleAssignmentRepository, RoleHolder};
pub use audit::{AuditEvent, AuditRepository};
pub use cache::RoleContextCache;
pub use catalog::RoleCatalog;
pub use directory::{ScopeDirectory, UserDirectory, UserRecord};
pub use seats::{SeatInstallation, SeatRepository, SeatVacancy};
