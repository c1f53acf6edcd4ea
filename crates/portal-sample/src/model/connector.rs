/// Represents an SMS connector (an operator route identified by MCC/MNC).
///
/// # Resource Framework
/// This struct implements the [`Resource`](resource_framework::Resource) trait,
/// allowing it to be served by a [`ResourceClient`](resource_framework::ResourceClient)
/// and cached under the `connectors` family.
///
/// See [`impl Resource for Connector`](#impl-Resource-for-Connector) for details on:
/// - Creation payload ([`ConnectorCreate`])
/// - Update payload ([`ConnectorUpdate`])
use resource_framework::resource::{require_text, resource_id};
use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient_int;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Connector {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: String,
    /// Mobile country code.
    #[serde(default, deserialize_with = "lenient_int")]
    pub mcc: Option<i64>,
    /// Mobile network code.
    #[serde(default, deserialize_with = "lenient_int")]
    pub mnc: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Connector {
    const FAMILY: &'static str = "connectors";
    const LABEL: &'static str = "connector";
    const PLURAL_KEY: Option<&'static str> = Some("connectors");
    const ID_ALIASES: &'static [&'static str] = &["connector_id"];
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Sms,
        read_method: Method::Post,
        list: "/connectors/list",
        get: "/connectors/get",
        create: "/connectors/create",
        update: "/connectors/update",
        delete: "/connectors/delete",
        change_status: "/connectors/change-status",
        page_size_key: "limit",
    };

    type Create = ConnectorCreate;
    type Update = ConnectorUpdate;

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

/// DTO for Connector creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorCreate {
    pub name: String,
    pub mcc: i64,
    pub mnc: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: Status,
}

impl ConnectorCreate {
    pub fn new(name: impl Into<String>, mcc: i64, mnc: i64) -> Self {
        Self {
            name: name.into(),
            mcc,
            mnc,
            url: None,
            status: Status::Active,
        }
    }
}

impl Payload for ConnectorCreate {
    fn validate(&self) -> Result<(), ResourceError> {
        require_text("Name", &self.name)?;
        check_mcc(self.mcc)?;
        check_mnc(self.mnc)
    }
}

/// DTO for Connector updates; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Payload for ConnectorUpdate {
    fn validate(&self) -> Result<(), ResourceError> {
        if let Some(name) = &self.name {
            require_text("Name", name)?;
        }
        if let Some(mcc) = self.mcc {
            check_mcc(mcc)?;
        }
        if let Some(mnc) = self.mnc {
            check_mnc(mnc)?;
        }
        Ok(())
    }
}

fn check_mcc(mcc: i64) -> Result<(), ResourceError> {
    if mcc > 0 {
        Ok(())
    } else {
        Err(ResourceError::validation("MCC must be a positive number"))
    }
}

fn check_mnc(mnc: i64) -> Result<(), ResourceError> {
    if mnc >= 0 {
        Ok(())
    } else {
        Err(ResourceError::validation("MNC must be zero or greater"))
    }
}
