use super::*;

use uuid::Uuid;
use warden_core::{TenantId, UserId};
use warden_domain::{
    AccessTier, AuditAction, FieldPermission, Role, RoleId, RolePermission, RoleType,
};

use crate::admin_ports::{RolePermissionInput, RoleSeed, RoleSeedSet, SeedOutcome};
use crate::authorization_ports::AuditEvent;

const BASELINE_SEED_VERSION: u32 = 1;

const BUSINESS_ENTITIES: &[EntityType] = &[
    EntityType::Contacts,
    EntityType::Companies,
    EntityType::Deals,
    EntityType::Quotes,
    EntityType::Tasks,
];

const ALL_ACTIONS: &[RecordAction] = &[
    RecordAction::View,
    RecordAction::Create,
    RecordAction::Edit,
    RecordAction::Delete,
    RecordAction::Export,
    RecordAction::Import,
    RecordAction::Assign,
];

impl RoleAdminService {
    /// Installs the roles of a seed set, skipping any that already exist by
    /// name. Safe to re-run; an unchanged tenant yields an all-skipped
    /// outcome and no audit event.
    ///
    /// Seeding is a bootstrap operation and takes no actor: it runs before
    /// any user holds the role-management permission.
    pub async fn seed_roles(
        &self,
        tenant_id: TenantId,
        seed_set: &RoleSeedSet,
    ) -> AppResult<SeedOutcome> {
        let mut outcome = SeedOutcome::default();

        for seed in &seed_set.roles {
            if self
                .repository
                .find_role_by_name(tenant_id, seed.name.as_str())
                .await?
                .is_some()
            {
                outcome.skipped.push(seed.name.clone());
                continue;
            }

            let role = Role::new(
                RoleId::new(),
                seed.name.clone(),
                seed.display_name.clone(),
                seed.level,
                RoleType::System,
                None,
            )?;

            let permissions: Vec<RolePermission> = seed
                .permissions
                .iter()
                .map(|statement| RolePermission {
                    role_id: role.role_id(),
                    entity: statement.entity,
                    action: statement.action,
                    tier: statement.tier,
                })
                .collect();
            let field_permissions: Vec<FieldPermission> = seed
                .field_permissions
                .iter()
                .map(|statement| FieldPermission {
                    role_id: role.role_id(),
                    entity: statement.entity,
                    field_name: statement.field_name.clone(),
                    can_view: statement.can_view,
                    can_edit: statement.can_edit,
                    mask_value: statement.mask_value,
                    mask_pattern: statement.mask_pattern.clone(),
                })
                .collect();

            self.repository
                .insert_role(tenant_id, role, permissions, field_permissions)
                .await?;

            tracing::info!(%tenant_id, role = %seed.name, "seeded role");
            outcome.created.push(seed.name.clone());
        }

        if !outcome.created.is_empty() {
            self.audit_repository
                .append_event(AuditEvent {
                    tenant_id,
                    user_id: UserId::from_uuid(Uuid::nil()),
                    action: AuditAction::RolesSeeded,
                    resource_type: "authz_role_seed".to_owned(),
                    resource_id: format!("v{}", seed_set.version),
                    detail: Some(format!(
                        "seeded roles: {}",
                        outcome.created.join(", ")
                    )),
                })
                .await?;
        }

        Ok(outcome)
    }
}

/// Returns the standard seed set: administrator, sales manager, sales rep,
/// and read-only roles.
#[must_use]
pub fn baseline_role_seed_set() -> RoleSeedSet {
    RoleSeedSet {
        version: BASELINE_SEED_VERSION,
        roles: vec![
            RoleSeed {
                name: "administrator".to_owned(),
                display_name: "Administrator".to_owned(),
                level: 100,
                permissions: statements(EntityType::all(), ALL_ACTIONS, AccessTier::All),
                field_permissions: Vec::new(),
            },
            RoleSeed {
                name: "sales_manager".to_owned(),
                display_name: "Sales Manager".to_owned(),
                level: 50,
                permissions: statements(
                    BUSINESS_ENTITIES,
                    &[
                        RecordAction::View,
                        RecordAction::Create,
                        RecordAction::Edit,
                        RecordAction::Delete,
                        RecordAction::Export,
                        RecordAction::Assign,
                    ],
                    AccessTier::Team,
                )
                .into_iter()
                .chain(statements(
                    &[EntityType::Products],
                    &[RecordAction::View],
                    AccessTier::All,
                ))
                .collect(),
                field_permissions: Vec::new(),
            },
            RoleSeed {
                name: "sales_rep".to_owned(),
                display_name: "Sales Representative".to_owned(),
                level: 10,
                permissions: statements(
                    BUSINESS_ENTITIES,
                    &[RecordAction::View, RecordAction::Create, RecordAction::Edit],
                    AccessTier::Own,
                )
                .into_iter()
                .chain(statements(
                    &[EntityType::Products],
                    &[RecordAction::View],
                    AccessTier::All,
                ))
                .collect(),
                field_permissions: Vec::new(),
            },
            RoleSeed {
                name: "read_only".to_owned(),
                display_name: "Read Only".to_owned(),
                level: 0,
                permissions: statements(
                    &[
                        EntityType::Contacts,
                        EntityType::Companies,
                        EntityType::Deals,
                        EntityType::Quotes,
                        EntityType::Tasks,
                        EntityType::Products,
                    ],
                    &[RecordAction::View],
                    AccessTier::All,
                ),
                field_permissions: Vec::new(),
            },
        ],
    }
}

fn statements(
    entities: &[EntityType],
    actions: &[RecordAction],
    tier: AccessTier,
) -> Vec<RolePermissionInput> {
    entities
        .iter()
        .flat_map(|entity| {
            actions.iter().map(move |action| RolePermissionInput {
                entity: *entity,
                action: *action,
                tier,
            })
        })
        .collect()
}
