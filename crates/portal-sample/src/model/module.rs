//! Portal modules (menu sections that permissions are granted on).
use resource_framework::resource::{require_text, resource_id};
use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Module {
    const FAMILY: &'static str = "modules";
    const LABEL: &'static str = "module";
    const PLURAL_KEY: Option<&'static str> = Some("modules");
    const ID_ALIASES: &'static [&'static str] = &["module_id"];
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Sms,
        read_method: Method::Post,
        list: "/modules/list",
        get: "/modules/get",
        create: "/modules/create",
        update: "/modules/update",
        delete: "/modules/delete",
        change_status: "/modules/change-status",
        page_size_key: "limit",
    };

    type Create = ModuleInput;
    type Update = ModuleInput;

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

/// DTO for Module creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ModuleInput {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }
}

impl Payload for ModuleInput {
    fn validate(&self) -> Result<(), ResourceError> {
        require_text("Name", &self.name)
    }
}
