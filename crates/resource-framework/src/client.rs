//! # Generic Resource Client
//!
//! [`ApiCaller`] turns one [`Call`] into one transport request and one result,
//! applying the credential gate and the error taxonomy in a single place.
//! [`ResourceClient<R>`] builds the calls for the standard operations of a
//! [`Resource`] (list, get-by-id, create, update, delete, change-status).
//!
//! The client never caches and never normalizes: it returns the raw envelope so
//! it stays reusable across differently-shaped endpoints. Normalization happens
//! in the query layer.

use crate::credential::CredentialStore;
use crate::envelope::is_empty_body;
use crate::error::ResourceError;
use crate::params::ListParams;
use crate::resource::{require_id, Payload, Resource, ResourceId};
use crate::status::Status;
use crate::transport::{Api, Method, Transport, TransportRequest};
use serde_json::{json, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The operation a call performs; drives cache keys and fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    ChangeStatus,
    /// A resource-specific read (e.g. `"summary"`).
    Custom(&'static str),
    /// A resource-specific write (e.g. `"permissions"`).
    Write(&'static str),
}

impl Operation {
    /// Segment used in query keys.
    pub fn key(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "detail",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ChangeStatus => "change-status",
            Operation::Custom(name) | Operation::Write(name) => name,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Operation::List => "loading",
            Operation::Get => "loading",
            Operation::Create => "creating",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
            Operation::ChangeStatus => "changing the status of",
            Operation::Custom(_) => "loading",
            Operation::Write(_) => "saving",
        }
    }

    /// Message for [`ResourceError::Unknown`].
    pub fn fallback_message(&self, label: &str) -> String {
        format!("Unexpected error while {} {}", self.verb(), self.subject(label))
    }

    fn subject(&self, label: &str) -> String {
        match self {
            Operation::List => format!("the {label} list"),
            Operation::Custom(name) | Operation::Write(name) => format!("{label} {name}"),
            _ => label.to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One backend call, fully described.
#[derive(Debug, Clone)]
pub struct Call {
    pub operation: Operation,
    pub label: &'static str,
    pub api: Api,
    pub method: Method,
    pub endpoint: &'static str,
    pub data: Value,
}

/// Shared entry point to the backends: transport plus credential store.
///
/// Cheap to clone; every domain client holds one.
#[derive(Clone)]
pub struct ApiCaller {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiCaller {
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Current credential, as used in query keys.
    pub fn credential(&self) -> Option<String> {
        self.credentials.credential()
    }

    /// Sends the call and translates every failure into a [`ResourceError`].
    pub async fn call(&self, call: Call) -> Result<Value, ResourceError> {
        let Some(credential) = self.credentials.credential() else {
            warn!(label = call.label, operation = %call.operation, "No credential, call not sent");
            return Err(ResourceError::MissingCredential);
        };

        debug!(
            label = call.label,
            operation = %call.operation,
            api = %call.api,
            endpoint = call.endpoint,
            "Calling backend"
        );
        let request = TransportRequest {
            method: call.method,
            api: call.api,
            endpoint: call.endpoint.to_string(),
            data: call.data,
            credential: Some(credential),
        };

        match self.transport.request(request).await {
            Ok(response) if is_empty_body(&response.body) => {
                warn!(label = call.label, operation = %call.operation, "Empty response body");
                Err(ResourceError::EmptyResponse {
                    what: call.operation.subject(call.label),
                })
            }
            Ok(response) => {
                info!(
                    label = call.label,
                    operation = %call.operation,
                    status = response.status,
                    "Backend call ok"
                );
                Ok(response.body)
            }
            Err(e) => {
                let err = ResourceError::from_transport(e, &call.operation.fallback_message(call.label));
                warn!(label = call.label, operation = %call.operation, error = %err, "Backend call failed");
                Err(err)
            }
        }
    }
}

/// A type-safe client for the standard operations of one resource.
pub struct ResourceClient<R: Resource> {
    caller: ApiCaller,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            caller: self.caller.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(caller: ApiCaller) -> Self {
        Self {
            caller,
            _resource: PhantomData,
        }
    }

    pub fn caller(&self) -> &ApiCaller {
        &self.caller
    }

    /// Builds a read against `endpoint` with the family's label, API and read method.
    pub fn read_call(&self, operation: Operation, endpoint: &'static str, data: Value) -> Call {
        Call {
            operation,
            label: R::LABEL,
            api: R::ENDPOINTS.api,
            method: R::ENDPOINTS.read_method,
            endpoint,
            data,
        }
    }

    /// Builds a write against `endpoint`; writes are always POSTed.
    pub fn write_call(&self, operation: Operation, endpoint: &'static str, data: Value) -> Call {
        Call {
            operation,
            label: R::LABEL,
            api: R::ENDPOINTS.api,
            method: Method::Post,
            endpoint,
            data,
        }
    }

    /// Lists records; returns the raw envelope.
    pub async fn list(&self, params: &ListParams) -> Result<Value, ResourceError> {
        let data = params.to_request(R::ENDPOINTS.page_size_key);
        self.caller
            .call(self.read_call(Operation::List, R::ENDPOINTS.list, data))
            .await
    }

    /// Fetches one record. A missing or falsy id fails without a network call.
    pub async fn get_by_id(&self, id: Option<&ResourceId>) -> Result<Value, ResourceError> {
        let id = require_id(id, R::LABEL)?;
        self.caller
            .call(self.read_call(Operation::Get, R::ENDPOINTS.get, json!({ "id": id })))
            .await
    }

    /// Creates a record after local validation.
    pub async fn create(&self, payload: &R::Create) -> Result<Value, ResourceError> {
        payload.validate()?;
        let data = to_body(payload, Operation::Create)?;
        self.caller
            .call(self.write_call(Operation::Create, R::ENDPOINTS.create, data))
            .await
    }

    /// Updates a record after the id check and local validation.
    pub async fn update(&self, id: Option<&ResourceId>, payload: &R::Update) -> Result<Value, ResourceError> {
        let id = require_id(id, R::LABEL)?;
        payload.validate()?;
        let mut data = to_body(payload, Operation::Update)?;
        match data.as_object_mut() {
            Some(obj) => {
                obj.insert("id".to_string(), json!(id));
            }
            None => return Err(ResourceError::unknown(Operation::Update.fallback_message(R::LABEL))),
        }
        self.caller
            .call(self.write_call(Operation::Update, R::ENDPOINTS.update, data))
            .await
    }

    pub async fn delete(&self, id: Option<&ResourceId>) -> Result<Value, ResourceError> {
        let id = require_id(id, R::LABEL)?;
        self.caller
            .call(self.write_call(Operation::Delete, R::ENDPOINTS.delete, json!({ "id": id })))
            .await
    }

    /// Sets the status; always sends the numeric form.
    pub async fn change_status(&self, id: Option<&ResourceId>, status: Status) -> Result<Value, ResourceError> {
        let id = require_id(id, R::LABEL)?;
        let data = json!({ "id": id, "status": status.code() });
        self.caller
            .call(self.write_call(Operation::ChangeStatus, R::ENDPOINTS.change_status, data))
            .await
    }
}

fn to_body<P: Payload>(payload: &P, operation: Operation) -> Result<Value, ResourceError> {
    serde_json::to_value(payload).map_err(|e| {
        warn!(error = %e, "Payload serialization failed");
        ResourceError::unknown(format!("Could not encode the request for {operation}"))
    })
}
