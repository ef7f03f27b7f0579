use super::*;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use warden_domain::{FieldAccess, mask_field_value};

impl AuthorizationService {
    /// Returns the merged field governance map for one entity.
    ///
    /// Fields with no statement are absent from the map; they are governed
    /// by the default-allow overlay in [`Self::apply_field_permissions`].
    pub async fn field_permissions(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
    ) -> AppResult<BTreeMap<String, FieldAccess>> {
        let set = self.resolve(tenant_id, user_id).await?;
        Ok(set.entity_fields(entity).cloned().unwrap_or_default())
    }

    /// Filters and masks a record's fields for display.
    ///
    /// Ungoverned keys pass through unchanged; a merged `can_view = false`
    /// drops the key; `mask_value = true` masks string values. Field
    /// governance is an opt-in overlay, so a record with no governance data
    /// comes back untouched.
    pub async fn apply_field_permissions(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        entity: EntityType,
        record: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        let governance = self.field_permissions(tenant_id, user_id, entity).await?;

        let mut filtered = Map::with_capacity(record.len());
        for (key, value) in record {
            let Some(access) = governance.get(key) else {
                filtered.insert(key.clone(), value.clone());
                continue;
            };

            if !access.can_view {
                continue;
            }

            let output = match value {
                Value::String(text) if access.mask_value => {
                    Value::String(mask_field_value(text, access.mask_pattern.as_deref()))
                }
                other => other.clone(),
            };
            filtered.insert(key.clone(), output);
        }

        Ok(filtered)
    }
}
