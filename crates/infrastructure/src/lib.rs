//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_directory;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_role_admin_repository;

pub use in_memory_directory::InMemoryDirectory;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_role_admin_repository::PostgresRoleAdminRepository;
