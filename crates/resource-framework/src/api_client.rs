//! # ApiClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default
//! list, detail, delete and status operations built on top of a generic
//! [`ResourceClient`].
use crate::envelope::{normalize_record, normalize_records};
use crate::{ListParams, Resource, ResourceClient, ResourceError, ResourceId, Status};
use async_trait::async_trait;
use serde_json::Value;

/// Trait for resource-specific clients to inherit the standard operations.
///
/// The raw methods (`list`, `get_by_id`, ...) return the backend envelope
/// untouched; `list_records` and `fetch_record` normalize it into typed records.
///
/// # Example
///
/// ```rust
/// use resource_framework::{
///     Api, ApiClient, Endpoints, Method, Payload, Resource, ResourceClient, ResourceId, Status,
/// };
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Deserialize)]
/// struct Tag { id: Option<ResourceId>, #[serde(default)] status: Status }
///
/// #[derive(Debug, Serialize)]
/// struct TagCreate { name: String }
/// impl Payload for TagCreate {}
///
/// impl Resource for Tag {
///     const FAMILY: &'static str = "tags";
///     const LABEL: &'static str = "tag";
///     const ENDPOINTS: Endpoints = Endpoints {
///         api: Api::Sms,
///         read_method: Method::Post,
///         list: "/tags/list",
///         get: "/tags/get",
///         create: "/tags/create",
///         update: "/tags/update",
///         delete: "/tags/delete",
///         change_status: "/tags/status",
///         page_size_key: "limit",
///     };
///     type Create = TagCreate;
///     type Update = TagCreate;
///     fn id(&self) -> Option<ResourceId> { self.id.clone() }
///     fn status(&self) -> Status { self.status }
/// }
///
/// struct TagClient { inner: ResourceClient<Tag> }
///
/// impl ApiClient<Tag> for TagClient {
///     fn inner(&self) -> &ResourceClient<Tag> { &self.inner }
/// }
///
/// // list(), get_by_id(), delete() and change_status() are provided automatically.
/// async fn usage(client: TagClient) {
///     let _ = client.delete(Some(&ResourceId::from(1i64))).await;
/// }
/// ```
#[async_trait]
pub trait ApiClient<R: Resource>: Send + Sync {
    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<R>;

    /// Lists records; returns the raw envelope.
    #[tracing::instrument(skip(self))]
    async fn list(&self, params: &ListParams) -> Result<Value, ResourceError> {
        tracing::debug!("Sending request");
        self.inner().list(params).await
    }

    /// Lists records and normalizes the envelope.
    #[tracing::instrument(skip(self))]
    async fn list_records(&self, params: &ListParams) -> Result<Vec<R>, ResourceError> {
        let body = self.inner().list(params).await?;
        Ok(normalize_records(&body, R::PLURAL_KEY))
    }

    /// Fetches one record; returns the raw envelope.
    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: Option<&ResourceId>) -> Result<Value, ResourceError> {
        tracing::debug!("Sending request");
        self.inner().get_by_id(id).await
    }

    /// Fetches one record and normalizes the envelope.
    #[tracing::instrument(skip(self))]
    async fn fetch_record(&self, id: Option<&ResourceId>) -> Result<R, ResourceError> {
        let body = self.inner().get_by_id(id).await?;
        let record = normalize_record(&body, R::PLURAL_KEY, R::ID_ALIASES).ok_or_else(|| {
            ResourceError::EmptyResponse {
                what: R::LABEL.to_string(),
            }
        })?;
        serde_json::from_value(record).map_err(|e| {
            tracing::warn!(error = %e, "Record does not match the expected shape");
            ResourceError::unknown(format!("Unexpected {} record from the server", R::LABEL))
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Option<&ResourceId>) -> Result<Value, ResourceError> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn change_status(&self, id: Option<&ResourceId>, status: Status) -> Result<Value, ResourceError> {
        tracing::debug!("Sending request");
        self.inner().change_status(id, status).await
    }
}
