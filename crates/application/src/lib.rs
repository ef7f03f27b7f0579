//! Application services and ports for the Warden authorization engine.

#![forbid(unsafe_code)]

mod admin_ports;
mod authorization_ports;
mod authorization_service;
mod role_admin_service;

pub use admin_ports::{
    AssignRoleInput, CreateRoleInput, CreateSharingRuleInput, FieldPermissionInput,
    RoleAdminRepository, RolePermissionInput, RoleSeed, RoleSeedSet, SeedOutcome,
};
pub use authorization_ports::{
    AuditEvent, AuditRepository, AuthorizationRepository, SharingRuleRepository, TeamDirectory,
};
pub use authorization_service::AuthorizationService;
pub use role_admin_service::{RoleAdminService, baseline_role_seed_set};
