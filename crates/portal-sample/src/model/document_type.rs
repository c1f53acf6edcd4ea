//! Billing document types (invoice, credit note, ...).
use resource_framework::resource::{require_text, resource_id};
use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentType {
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

impl Resource for DocumentType {
    const FAMILY: &'static str = "document-types";
    const LABEL: &'static str = "document type";
    const PLURAL_KEY: Option<&'static str> = Some("types");
    const ID_ALIASES: &'static [&'static str] = &["type_id"];
    // The billing API reads with GET and pages with `per_page`.
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Billing,
        read_method: Method::Get,
        list: "/document-types",
        get: "/document-types/show",
        create: "/document-types/store",
        update: "/document-types/update",
        delete: "/document-types/destroy",
        change_status: "/document-types/change-status",
        page_size_key: "per_page",
    };

    type Create = DocumentTypeInput;
    type Update = DocumentTypeInput;

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

/// DTO for DocumentType creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentTypeInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DocumentTypeInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl Payload for DocumentTypeInput {
    fn validate(&self) -> Result<(), ResourceError> {
        require_text("Name", &self.name)
    }
}
