//! # Role Permissions
//!
//! Roles are the only resource with operations beyond the standard set: the
//! modules (and actions inside them) granted to a role can be listed and
//! replaced.
use super::RoleClient;
use crate::model::{PermissionAssignment, Role, RoleModule};
use resource_framework::envelope::normalize_records;
use resource_framework::resource::require_id;
use resource_framework::{Operation, Payload, Resource, ResourceError, ResourceId};
use serde_json::{json, Value};
use tracing::{debug, instrument};

pub const ROLE_PERMISSIONS_ENDPOINT: &str = "/roles/permissions";
pub const ASSIGN_PERMISSIONS_ENDPOINT: &str = "/roles/assign-permissions";

/// Operation used for permission reads; also the query key segment.
pub const PERMISSIONS: Operation = Operation::Custom("permissions");
/// Operation used for permission writes.
pub const ASSIGN_PERMISSIONS: Operation = Operation::Write("permissions");

impl RoleClient {
    /// Lists the modules granted to a role; returns the raw envelope.
    #[instrument(skip(self))]
    pub async fn role_modules(&self, role_id: Option<&ResourceId>) -> Result<Value, ResourceError> {
        let role_id = require_id(role_id, Role::LABEL)?;
        debug!("Sending request");
        let call = self
            .inner
            .read_call(PERMISSIONS, ROLE_PERMISSIONS_ENDPOINT, json!({ "role_id": role_id }));
        self.inner.caller().call(call).await
    }

    /// Lists the modules granted to a role, normalized.
    #[instrument(skip(self))]
    pub async fn role_module_records(&self, role_id: Option<&ResourceId>) -> Result<Vec<RoleModule>, ResourceError> {
        let body = self.role_modules(role_id).await?;
        Ok(normalize_records(&body, Some("modules")))
    }

    /// Replaces the permissions of a role.
    #[instrument(skip(self))]
    pub async fn assign_permissions(&self, assignment: &PermissionAssignment) -> Result<Value, ResourceError> {
        assignment.validate()?;
        let data = serde_json::to_value(assignment)
            .map_err(|_| ResourceError::unknown(ASSIGN_PERMISSIONS.fallback_message(Role::LABEL)))?;
        debug!("Sending request");
        let call = self.inner.write_call(ASSIGN_PERMISSIONS, ASSIGN_PERMISSIONS_ENDPOINT, data);
        self.inner.caller().call(call).await
    }
}
