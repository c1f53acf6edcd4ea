//! # Resource Trait
//!
//! The `Resource` trait defines the contract every backend entity (connector,
//! document type, role, ...) implements to be served by the generic
//! [`ResourceClient`](crate::client::ResourceClient) and the query layer.
//!
//! Associated constants describe where the resource lives (`ENDPOINTS`), how its
//! cache entries are grouped (`FAMILY`), which envelope key may carry its list
//! (`PLURAL_KEY`) and which fields may alias its identifier (`ID_ALIASES`).
//! Associated types pin the create/update payloads, so a role payload can't be
//! sent to the connectors endpoint.

use crate::error::ResourceError;
use crate::status::Status;
use crate::transport::{Api, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Debug, Display};

/// Identifier of a record; the backends use both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl ResourceId {
    /// `0` and blank strings don't identify anything.
    pub fn is_falsy(&self) -> bool {
        match self {
            ResourceId::Number(n) => *n == 0,
            ResourceId::Text(s) => s.trim().is_empty(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(ResourceId::Number),
            Value::String(s) => Some(ResourceId::Text(s.clone())),
            _ => None,
        }
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{n}"),
            ResourceId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        ResourceId::Number(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Text(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId::Text(id)
    }
}

/// Returns the id if it is present and truthy, otherwise a validation error.
pub fn require_id<'a>(id: Option<&'a ResourceId>, label: &str) -> Result<&'a ResourceId, ResourceError> {
    match id {
        Some(id) if !id.is_falsy() => Ok(id),
        _ => Err(ResourceError::validation(format!("A {label} id is required"))),
    }
}

/// Canonical identifier accessor over an open record: `id`, then each alias in order.
pub fn resource_id(record: &Map<String, Value>, aliases: &[&str]) -> Option<ResourceId> {
    std::iter::once("id")
        .chain(aliases.iter().copied())
        .filter_map(|key| record.get(key))
        .find_map(ResourceId::from_value)
}

/// Endpoint paths of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub api: Api,
    /// Verb used for `list` and `get_by_id`; writes always use POST.
    pub read_method: Method,
    pub list: &'static str,
    pub get: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
    pub change_status: &'static str,
    /// Name of the page-size parameter (`limit` or `per_page`).
    pub page_size_key: &'static str,
}

/// A request body that can check itself before it is sent.
pub trait Payload: Serialize + Debug + Send + Sync + 'static {
    /// Local validation; the default accepts everything.
    fn validate(&self) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Fails when a required text field is blank.
pub fn require_text(field: &str, value: &str) -> Result<(), ResourceError> {
    if value.trim().is_empty() {
        Err(ResourceError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Trait that any backend entity implements to be managed by the framework.
pub trait Resource: DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Cache family and first segment of every query key (e.g. `"connectors"`).
    const FAMILY: &'static str;

    /// Singular, human-readable name used in messages (e.g. `"connector"`).
    const LABEL: &'static str;

    /// Envelope key that may carry the list (e.g. `"types"`).
    const PLURAL_KEY: Option<&'static str> = None;

    /// Fields that may hold the identifier when `id` is absent.
    const ID_ALIASES: &'static [&'static str] = &[];

    const ENDPOINTS: Endpoints;

    type Create: Payload;
    type Update: Payload;

    fn id(&self) -> Option<ResourceId>;

    fn status(&self) -> Status;
}
