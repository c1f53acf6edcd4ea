//! Actions (operations inside a module that can be granted to a role).
use resource_framework::resource::{require_text, resource_id};
use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module_id: Option<ResourceId>,
    #[serde(default)]
    pub status: Status,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Action {
    const FAMILY: &'static str = "actions";
    const LABEL: &'static str = "action";
    const PLURAL_KEY: Option<&'static str> = Some("actions");
    const ID_ALIASES: &'static [&'static str] = &["action_id"];
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Sms,
        read_method: Method::Post,
        list: "/actions/list",
        get: "/actions/get",
        create: "/actions/create",
        update: "/actions/update",
        delete: "/actions/delete",
        change_status: "/actions/change-status",
        page_size_key: "limit",
    };

    type Create = ActionInput;
    type Update = ActionInput;

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

/// DTO for Action creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionInput {
    pub name: String,
    pub module_id: Option<ResourceId>,
}

impl ActionInput {
    pub fn new(name: impl Into<String>, module_id: impl Into<ResourceId>) -> Self {
        Self {
            name: name.into(),
            module_id: Some(module_id.into()),
        }
    }
}

impl Payload for ActionInput {
    fn validate(&self) -> Result<(), ResourceError> {
        require_text("Name", &self.name)?;
        match &self.module_id {
            Some(id) if !id.is_falsy() => Ok(()),
            _ => Err(ResourceError::validation("A module is required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_is_required() {
        assert!(ActionInput::new("Export", 4i64).validate().is_ok());
        assert!(ActionInput::new("Export", 0i64).validate().is_err());
        let missing = ActionInput {
            name: "Export".into(),
            module_id: None,
        };
        assert_eq!(
            missing.validate(),
            Err(ResourceError::validation("A module is required"))
        );
    }
}
