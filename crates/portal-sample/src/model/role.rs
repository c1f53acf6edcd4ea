//! Roles and the module/action permissions granted to them.
use resource_framework::resource::{require_id, require_text, resource_id};
use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Role {
    const FAMILY: &'static str = "roles";
    const LABEL: &'static str = "role";
    const PLURAL_KEY: Option<&'static str> = Some("roles");
    const ID_ALIASES: &'static [&'static str] = &["role_id"];
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Sms,
        read_method: Method::Post,
        list: "/roles/list",
        get: "/roles/get",
        create: "/roles/create",
        update: "/roles/update",
        delete: "/roles/delete",
        change_status: "/roles/change-status",
        page_size_key: "limit",
    };

    type Create = RoleInput;
    type Update = RoleInput;

    fn id(&self) -> Option<ResourceId> {
        self.id
            .clone()
            .filter(|id| !id.is_falsy())
            .or_else(|| resource_id(&self.extra, Self::ID_ALIASES))
    }

    fn status(&self) -> Status {
        self.status
    }
}

/// DTO for Role creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RoleInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl Payload for RoleInput {
    fn validate(&self) -> Result<(), ResourceError> {
        require_text("Name", &self.name)
    }
}

/// A module granted to a role, with the actions allowed inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePermission {
    pub module_id: ResourceId,
    #[serde(default)]
    pub action_ids: Vec<ResourceId>,
}

/// Replaces the permissions of one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionAssignment {
    pub role_id: ResourceId,
    pub modules: Vec<ModulePermission>,
}

impl Payload for PermissionAssignment {
    fn validate(&self) -> Result<(), ResourceError> {
        require_id(Some(&self.role_id), Role::LABEL)?;
        if self.modules.iter().any(|m| m.module_id.is_falsy()) {
            return Err(ResourceError::validation("Every permission needs a module"));
        }
        Ok(())
    }
}

/// A row of the role-permissions listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleModule {
    #[serde(default)]
    pub module_id: Option<ResourceId>,
    #[serde(default, alias = "name")]
    pub module_name: Option<String>,
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_requires_role_and_modules() {
        let ok = PermissionAssignment {
            role_id: ResourceId::Number(2),
            modules: vec![ModulePermission {
                module_id: ResourceId::Number(5),
                action_ids: vec![ResourceId::Number(9)],
            }],
        };
        assert!(ok.validate().is_ok());

        let no_role = PermissionAssignment {
            role_id: ResourceId::Number(0),
            modules: vec![],
        };
        assert!(no_role.validate().is_err());

        let bad_module = PermissionAssignment {
            role_id: ResourceId::Number(2),
            modules: vec![ModulePermission {
                module_id: ResourceId::Text(String::new()),
                action_ids: vec![],
            }],
        };
        assert!(bad_module.validate().is_err());
    }
}
