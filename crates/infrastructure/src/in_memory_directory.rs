use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use warden_application::{
    AuditEvent, AuditRepository, AuthorizationRepository, RoleAdminRepository,
    SharingRuleRepository, TeamDirectory,
};
use warden_core::{AppError, AppResult, TenantId, UserId};
use warden_domain::{
    DataSharingRule, EntityType, FieldPermission, Role, RoleAssignment, RoleId, RolePermission,
    TeamId,
};

/// In-memory implementation of every authorization port.
///
/// Backs tests and single-process deployments; all state is tenant-keyed and
/// lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    roles: RwLock<HashMap<(TenantId, RoleId), Role>>,
    permissions: RwLock<HashMap<(TenantId, RoleId), Vec<RolePermission>>>,
    field_permissions: RwLock<HashMap<(TenantId, RoleId), Vec<FieldPermission>>>,
    assignments: RwLock<Vec<(TenantId, RoleAssignment)>>,
    teams: RwLock<HashMap<(TenantId, UserId), TeamId>>,
    rules: RwLock<Vec<(TenantId, DataSharingRule)>>,
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user's current team membership.
    ///
    /// Team membership is owned by the host application; this directory only
    /// mirrors it for TEAM tier checks.
    pub async fn set_team(&self, tenant_id: TenantId, user_id: UserId, team_id: Option<TeamId>) {
        let mut teams = self.teams.write().await;
        match team_id {
            Some(team_id) => {
                teams.insert((tenant_id, user_id), team_id);
            }
            None => {
                teams.remove(&(tenant_id, user_id));
            }
        }
    }

    /// Returns a copy of every audit event appended so far.
    pub async fn recorded_events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryDirectory {
    async fn list_assignments_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter_map(|(stored_tenant_id, assignment)| {
                (stored_tenant_id == &tenant_id && assignment.user_id == user_id)
                    .then(|| assignment.clone())
            })
            .collect())
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&(tenant_id, role_id)).cloned())
    }

    async fn list_role_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<RolePermission>> {
        Ok(self
            .permissions
            .read()
            .await
            .get(&(tenant_id, role_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_field_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<FieldPermission>> {
        Ok(self
            .field_permissions
            .read()
            .await
            .get(&(tenant_id, role_id))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TeamDirectory for InMemoryDirectory {
    async fn current_team_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamId>> {
        Ok(self.teams.read().await.get(&(tenant_id, user_id)).copied())
    }
}

#[async_trait]
impl SharingRuleRepository for InMemoryDirectory {
    async fn list_active_rules(
        &self,
        tenant_id: TenantId,
        entity: EntityType,
    ) -> AppResult<Vec<DataSharingRule>> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter_map(|(stored_tenant_id, rule)| {
                (stored_tenant_id == &tenant_id && rule.is_active && rule.entity == entity)
                    .then(|| rule.clone())
            })
            .collect())
    }
}

#[async_trait]
impl AuditRepository for InMemoryDirectory {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl RoleAdminRepository for InMemoryDirectory {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let mut listed: Vec<Role> = roles
            .iter()
            .filter_map(|((stored_tenant_id, _), role)| {
                (stored_tenant_id == &tenant_id).then(|| role.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&(tenant_id, role_id)).cloned())
    }

    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find_map(|((stored_tenant_id, _), role)| {
                (stored_tenant_id == &tenant_id && role.name().as_str() == name)
                    .then(|| role.clone())
            }))
    }

    async fn insert_role(
        &self,
        tenant_id: TenantId,
        role: Role,
        permissions: Vec<RolePermission>,
        field_permissions: Vec<FieldPermission>,
    ) -> AppResult<()> {
        let key = (tenant_id, role.role_id());
        let mut roles = self.roles.write().await;
        if roles.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for tenant '{}'",
                role.name(),
                tenant_id
            )));
        }

        roles.insert(key, role);
        self.permissions.write().await.insert(key, permissions);
        self.field_permissions
            .write()
            .await
            .insert(key, field_permissions);
        Ok(())
    }

    async fn set_role_parent(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let Some(role) = roles.get(&(tenant_id, role_id)) else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };

        let updated = role.clone().with_parent(parent_role_id);
        roles.insert((tenant_id, role_id), updated);
        Ok(())
    }

    async fn set_role_active(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        is_active: bool,
    ) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let Some(role) = roles.get(&(tenant_id, role_id)) else {
            return Err(AppError::NotFound(format!("role '{role_id}' not found")));
        };

        let updated = role.clone().with_active(is_active);
        roles.insert((tenant_id, role_id), updated);
        Ok(())
    }

    async fn insert_assignment(
        &self,
        tenant_id: TenantId,
        assignment: RoleAssignment,
    ) -> AppResult<()> {
        self.assignments.write().await.push((tenant_id, assignment));
        Ok(())
    }

    async fn expire_assignments(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: RoleId,
        expires_at: DateTime<Utc>,
    ) -> AppResult<usize> {
        let mut assignments = self.assignments.write().await;
        let mut expired = 0;
        for (stored_tenant_id, assignment) in assignments.iter_mut() {
            if stored_tenant_id == &tenant_id
                && assignment.user_id == user_id
                && assignment.role_id == role_id
                && assignment.expires_at.is_none_or(|current| current > expires_at)
            {
                assignment.expires_at = Some(expires_at);
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn insert_sharing_rule(
        &self,
        tenant_id: TenantId,
        rule: DataSharingRule,
    ) -> AppResult<()> {
        self.rules.write().await.push((tenant_id, rule));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use warden_application::{
        AssignRoleInput, AuthorizationService, CreateSharingRuleInput, RoleAdminRepository,
        RoleAdminService, baseline_role_seed_set,
    };
    use warden_core::{TenantId, UserId, UserIdentity};
    use warden_domain::{AccessTier, EntityType, RecordAction, RoleAssignment, ShareTarget};

    use super::InMemoryDirectory;

    struct Stack {
        directory: Arc<InMemoryDirectory>,
        authorization: AuthorizationService,
        admin: RoleAdminService,
        tenant_id: TenantId,
    }

    fn stack() -> Stack {
        let directory = Arc::new(InMemoryDirectory::new());
        let authorization = AuthorizationService::new(
            directory.clone(),
            directory.clone(),
            directory.clone(),
            directory.clone(),
        );
        let admin = RoleAdminService::new(
            directory.clone(),
            authorization.clone(),
            directory.clone(),
        );
        Stack {
            directory,
            authorization,
            admin,
            tenant_id: TenantId::new(),
        }
    }

    async fn seeded_admin(stack: &Stack) -> UserIdentity {
        let outcome = stack
            .admin
            .seed_roles(stack.tenant_id, &baseline_role_seed_set())
            .await;
        assert!(outcome.is_ok());

        let admin_user = UserId::new();
        let administrator = stack
            .directory
            .find_role_by_name(stack.tenant_id, "administrator")
            .await;
        let role_id = match administrator {
            Ok(Some(role)) => role.role_id(),
            _ => panic!("baseline seed must install the administrator role"),
        };
        let inserted = stack
            .directory
            .insert_assignment(
                stack.tenant_id,
                RoleAssignment {
                    user_id: admin_user,
                    role_id,
                    starts_at: Utc::now() - Duration::minutes(1),
                    expires_at: None,
                },
            )
            .await;
        assert!(inserted.is_ok());
        UserIdentity::new(admin_user, "Admin", stack.tenant_id)
    }

    #[tokio::test]
    async fn seed_assign_and_check_end_to_end() {
        let stack = stack();
        let admin = seeded_admin(&stack).await;

        let roles = match stack.admin.list_roles(&admin).await {
            Ok(roles) => roles,
            Err(error) => panic!("listing must succeed: {error}"),
        };
        let sales_rep = roles.iter().find(|role| role.name().as_str() == "sales_rep");
        let sales_rep_id = match sales_rep {
            Some(role) => role.role_id(),
            None => panic!("baseline seed must install the sales_rep role"),
        };

        let user_id = UserId::new();
        let assigned = stack
            .admin
            .assign_role(
                &admin,
                AssignRoleInput {
                    user_id,
                    role_id: sales_rep_id,
                    starts_at: None,
                    expires_at: None,
                },
            )
            .await;
        assert!(assigned.is_ok());

        let own_record = stack
            .authorization
            .check_permission(
                stack.tenant_id,
                user_id,
                EntityType::Contacts,
                RecordAction::Edit,
                Some(user_id),
                None,
            )
            .await;
        match own_record {
            Ok(decision) => {
                assert!(decision.allowed);
                assert_eq!(decision.tier, Some(AccessTier::Own));
            }
            Err(error) => panic!("check must succeed: {error}"),
        }

        let foreign_record = stack
            .authorization
            .check_permission(
                stack.tenant_id,
                user_id,
                EntityType::Contacts,
                RecordAction::Edit,
                Some(UserId::new()),
                None,
            )
            .await;
        assert!(foreign_record.is_ok_and(|decision| !decision.allowed));
    }

    #[tokio::test]
    async fn sharing_rule_created_through_the_service_grants_access() {
        let stack = stack();
        let admin = seeded_admin(&stack).await;
        let user_id = UserId::new();

        let created = stack
            .admin
            .create_sharing_rule(
                &admin,
                CreateSharingRuleInput {
                    entity: EntityType::Deals,
                    actions: vec![RecordAction::View],
                    share_with: ShareTarget::User { user_id },
                    conditions: Vec::new(),
                },
            )
            .await;
        assert!(created.is_ok());

        let granted = stack
            .authorization
            .check_data_sharing_rules(
                stack.tenant_id,
                user_id,
                EntityType::Deals,
                RecordAction::View,
                &serde_json::json!({}),
            )
            .await;
        assert!(granted.is_ok_and(|granted| granted));
    }

    #[tokio::test]
    async fn teams_are_scoped_per_tenant() {
        let directory = InMemoryDirectory::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let user_id = UserId::new();
        let team_id = warden_domain::TeamId::new();

        directory.set_team(tenant_a, user_id, Some(team_id)).await;

        use warden_application::TeamDirectory;
        let in_a = directory.current_team_for_user(tenant_a, user_id).await;
        assert!(in_a.is_ok_and(|team| team == Some(team_id)));
        let in_b = directory.current_team_for_user(tenant_b, user_id).await;
        assert!(in_b.is_ok_and(|team| team.is_none()));
    }
}
