//! # Resource Queries
//!
//! Binds a [`ResourceClient<R>`] to the query cache: list and detail reads become
//! keyed [`Query`]s, writes become guarded [`Mutation`]s that invalidate the
//! resource family.
//!
//! Keys have the form `[family, operation, params, credential]`, where `params`
//! is the canonical JSON of the request and `credential` a fingerprint of the
//! current API key, so two sessions never share an entry.

use crate::cache::{FetchFuture, QueryKey};
use crate::client::{ApiCaller, Operation, ResourceClient};
use crate::credential::fingerprint;
use crate::envelope::{normalize_record, normalize_records};
use crate::mutation::{Mutation, MutationMessages};
use crate::params::ListParams;
use crate::query::{Query, QueryClient};
use crate::resource::{Resource, ResourceId};
use futures::FutureExt;
use serde_json::Value;
use tracing::warn;

const ANONYMOUS: &str = "anonymous";

/// `[family, operation, params, credential]` key for any read made through `caller`.
pub fn query_key(family: &str, operation: Operation, params: &Value, caller: &ApiCaller) -> QueryKey {
    let credential = caller
        .credential()
        .map(|k| fingerprint(&k))
        .unwrap_or_else(|| ANONYMOUS.to_string());
    QueryKey::new([
        family.to_string(),
        operation.key().to_string(),
        params.to_string(),
        credential,
    ])
}

/// Query and mutation factory for one resource family.
pub struct ResourceQueries<R: Resource> {
    client: ResourceClient<R>,
    queries: QueryClient,
}

impl<R: Resource> Clone for ResourceQueries<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<R: Resource> ResourceQueries<R> {
    pub fn new(client: ResourceClient<R>, queries: QueryClient) -> Self {
        Self { client, queries }
    }

    pub fn client(&self) -> &ResourceClient<R> {
        &self.client
    }

    /// Cache key for an operation with the given request parameters.
    pub fn key(&self, operation: Operation, params: &Value) -> QueryKey {
        query_key(R::FAMILY, operation, params, self.client.caller())
    }

    /// Normalized list read. Disabled while `enabled` is false or no credential is present.
    pub fn list(&self, params: ListParams, enabled: bool) -> Query<Vec<R>> {
        let key = self.key(Operation::List, &params.to_request(R::ENDPOINTS.page_size_key));
        let has_credential = self.client.caller().credential().is_some();
        let client = self.client.clone();

        self.queries
            .query(
                key,
                move || {
                    let client = client.clone();
                    let params = params.clone();
                    async move { client.list(&params).await }.boxed()
                },
                |body: &Value| normalize_records::<R>(body, R::PLURAL_KEY),
            )
            .enabled(enabled && has_credential)
            .error_title(format!("Could not load the {} list", R::LABEL))
    }

    /// Normalized detail read. Disabled for a missing or falsy id, and while no
    /// credential is present.
    pub fn detail(&self, id: Option<ResourceId>) -> Query<Option<R>> {
        let has_credential = self.client.caller().credential().is_some();
        let enabled = has_credential && id.as_ref().is_some_and(|id| !id.is_falsy());
        let key_id = id.as_ref().map_or(Value::Null, |id| Value::from(id.to_string()));
        let key = self.key(Operation::Get, &key_id);
        let client = self.client.clone();

        self.queries
            .query(
                key,
                move || {
                    let client = client.clone();
                    let id = id.clone();
                    async move { client.get_by_id(id.as_ref()).await }.boxed()
                },
                |body: &Value| {
                    let record = normalize_record(body, R::PLURAL_KEY, R::ID_ALIASES)?;
                    serde_json::from_value::<R>(record)
                        .map_err(|e| warn!(error = %e, label = R::LABEL, "Record does not match the expected shape"))
                        .ok()
                },
            )
            .enabled(enabled)
            .error_title(format!("Could not load the {}", R::LABEL))
    }

    pub fn create(&self) -> Mutation<R::Create> {
        let client = self.client.clone();
        self.mutation(Operation::Create, move |payload: R::Create| {
            let client = client.clone();
            async move { client.create(&payload).await }.boxed()
        })
    }

    pub fn update(&self) -> Mutation<(ResourceId, R::Update)> {
        let client = self.client.clone();
        self.mutation(Operation::Update, move |(id, payload): (ResourceId, R::Update)| {
            let client = client.clone();
            async move { client.update(Some(&id), &payload).await }.boxed()
        })
    }

    pub fn delete(&self) -> Mutation<ResourceId> {
        let client = self.client.clone();
        self.mutation(Operation::Delete, move |id: ResourceId| {
            let client = client.clone();
            async move { client.delete(Some(&id)).await }.boxed()
        })
    }

    /// Flips the status of the given record, as it is at submission time.
    pub fn toggle_status(&self) -> Mutation<R> {
        let client = self.client.clone();
        self.mutation(Operation::ChangeStatus, move |record: R| {
            let client = client.clone();
            async move {
                let id = record.id();
                client.change_status(id.as_ref(), record.status().toggled()).await
            }
            .boxed()
        })
    }

    fn mutation<I, F>(&self, operation: Operation, run: F) -> Mutation<I>
    where
        I: Send + 'static,
        F: Fn(I) -> FetchFuture + Send + Sync + 'static,
    {
        Mutation::new(
            &self.queries,
            R::FAMILY,
            MutationMessages::for_operation(R::LABEL, operation),
            run,
        )
    }
}
