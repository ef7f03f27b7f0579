use super::*;

use std::collections::HashSet;

use chrono::Utc;
use warden_domain::Role;

impl AuthorizationService {
    /// Aggregates all currently-valid role assignments into one effective
    /// permission set.
    ///
    /// Each assigned role's ancestor chain is applied parent-to-child, so a
    /// child's statements fold in after its ancestors'. Entity permissions
    /// keep the highest tier seen for an (entity, action) pair; field
    /// permissions merge most-restrictive for view/edit and most-aggressive
    /// for masking. A user with no valid assignments resolves to an empty
    /// set, which fails every subsequent check.
    pub(super) async fn resolve_effective_set(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<EffectivePermissionSet> {
        let now = Utc::now();
        let assignments = self
            .repository
            .list_assignments_for_user(tenant_id, user_id)
            .await?;

        let mut set = EffectivePermissionSet::new();

        for assignment in assignments {
            if !assignment.is_active_at(now) {
                continue;
            }

            let Some(role) = self
                .repository
                .find_role(tenant_id, assignment.role_id)
                .await?
            else {
                tracing::warn!(
                    %tenant_id,
                    role_id = %assignment.role_id,
                    "role assignment references a missing role; skipping"
                );
                continue;
            };

            // An inactive assigned role contributes nothing at all.
            if !role.is_active() {
                continue;
            }

            for role in self.ancestor_chain(tenant_id, role).await? {
                // An inactive ancestor stops contributing, but the rest of
                // the chain still applies.
                if !role.is_active() {
                    continue;
                }

                for statement in self
                    .repository
                    .list_role_permissions(tenant_id, role.role_id())
                    .await?
                {
                    set.apply_permission(&statement);
                }

                for statement in self
                    .repository
                    .list_field_permissions(tenant_id, role.role_id())
                    .await?
                {
                    set.apply_field_permission(&statement);
                }
            }
        }

        Ok(set)
    }

    /// Returns the role's inheritance chain in parent-to-child order.
    ///
    /// Cycle prevention belongs to the role administration service at edit
    /// time; a cycle reaching this traversal is a configuration defect, so
    /// the walk keeps a visited set, warns, and truncates instead of
    /// looping.
    async fn ancestor_chain(&self, tenant_id: TenantId, leaf: Role) -> AppResult<Vec<Role>> {
        let mut visited = HashSet::from([leaf.role_id()]);
        let mut chain = vec![leaf];

        while let Some(parent_id) = chain.last().and_then(Role::parent_role_id) {
            if !visited.insert(parent_id) {
                tracing::warn!(
                    %tenant_id,
                    role_id = %parent_id,
                    "role parent chain contains a cycle; truncating traversal"
                );
                break;
            }

            match self.repository.find_role(tenant_id, parent_id).await? {
                Some(parent) => chain.push(parent),
                None => {
                    tracing::warn!(
                        %tenant_id,
                        role_id = %parent_id,
                        "role parent chain references a missing role; truncating traversal"
                    );
                    break;
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }
}
