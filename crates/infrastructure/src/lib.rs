//! Infrastructure adapters for the access-control ports.

#![forbid(unsafe_code)]

mod in_memory_role_context_cache;
mod postgres_audit_repository;
mod postgres_role_assignment_repository;
mod postgres_role_catalog;
mod postgres_scope_directory;
mod postgres_seat_repository;
mod postgres_user_directory;
mod redis_role_context_cache;

pub use in_memory_role_context_cache::InMemoryRoleContextCache;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_assignment_repository::PostgresRoleAssignmentRepository;
pub use postgres_role_catalog::PostgresRoleCatalog;
pub use postgres_scope_directory::PostgresScopeDirectory;
pub use postgres_seat_repository::PostgresSeatRepository;
pub use postgres_user_directory::PostgresUserDirectory;
pub use redis_role_context_cache::RedisRoleContextCache;
