//! # Normalizing Query
//!
//! A [`Query<T>`] is a cached, de-duplicated read bound to one [`QueryKey`].
//! The fetcher returns the raw envelope; the selector turns it into the shape
//! consumers want (usually via [`normalize_records`](crate::envelope::normalize_records)),
//! so every consumer sees one canonical shape no matter which envelope the
//! backend chose.
//!
//! State is published on a `tokio::sync::watch` channel. Consumers can either
//! await [`Query::fetch`] directly or [`Query::subscribe`] to follow it.
//!
//! ```rust
//! use futures::FutureExt;
//! use resource_framework::cache::{CacheActor, QueryKey};
//! use resource_framework::notify::TracingNotifier;
//! use resource_framework::query::QueryClient;
//! use resource_framework::ResourceError;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, cache) = CacheActor::new(8);
//!     tokio::spawn(actor.run());
//!     let client = QueryClient::new(cache, Arc::new(TracingNotifier));
//!
//!     let query = client.query(
//!         QueryKey::new(["numbers", "list"]),
//!         || async { Ok::<_, ResourceError>(json!({ "data": [1, 2, 3] })) }.boxed(),
//!         |body: &Value| body["data"].as_array().map(Vec::len).unwrap_or(0),
//!     );
//!     let state = query.fetch().await;
//!     assert_eq!(state.data, Some(3));
//! }
//! ```

use crate::cache::{FetchFuture, QueryCache, QueryKey, Source};
use crate::error::ResourceError;
use crate::notify::{Notification, Notifier};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Default notification title for failed reads.
pub const DEFAULT_ERROR_TITLE: &str = "Error";

type SharedFetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;
type Selector<T> = Arc<dyn Fn(&Value) -> T + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// `enabled` is false; nothing runs.
    Disabled,
    /// Enabled but not fetched yet.
    Idle,
    Loading,
    Success,
    Error,
}

/// Observable state of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Last successful data; kept across a later failure.
    pub data: Option<T>,
    pub error: Option<ResourceError>,
}

impl<T> QueryState<T> {
    fn initial(enabled: bool) -> Self {
        Self {
            status: if enabled {
                QueryStatus::Idle
            } else {
                QueryStatus::Disabled
            },
            data: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_disabled(&self) -> bool {
        self.status == QueryStatus::Disabled
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

impl<T> QueryState<Vec<T>> {
    /// "No records found": a successful read that produced nothing.
    pub fn is_empty(&self) -> bool {
        self.is_success() && self.data.as_ref().map_or(true, Vec::is_empty)
    }
}

/// Factory for queries sharing one cache and one notifier.
#[derive(Clone)]
pub struct QueryClient {
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl QueryClient {
    pub fn new(cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Builds an enabled query; see [`Query::enabled`] and [`Query::error_title`].
    pub fn query<T, F, S>(&self, key: QueryKey, fetcher: F, selector: S) -> Query<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> FetchFuture + Send + Sync + 'static,
        S: Fn(&Value) -> T + Send + Sync + 'static,
    {
        Query {
            key,
            fetcher: Arc::new(fetcher),
            selector: Arc::new(selector),
            enabled: true,
            error_title: DEFAULT_ERROR_TITLE.to_string(),
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
            state: Arc::new(watch::Sender::new(QueryState::initial(true))),
        }
    }
}

/// A cached read bound to one key.
pub struct Query<T> {
    key: QueryKey,
    fetcher: SharedFetcher,
    selector: Selector<T>,
    enabled: bool,
    error_title: String,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<QueryState<T>>>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetcher: self.fetcher.clone(),
            selector: self.selector.clone(),
            enabled: self.enabled,
            error_title: self.error_title.clone(),
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Query<T> {
    /// A disabled query never executes and reports [`QueryStatus::Disabled`].
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self.state.send_replace(QueryState::initial(enabled));
        self
    }

    pub fn error_title(mut self, title: impl Into<String>) -> Self {
        self.error_title = title.into();
        self
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Reads through the cache.
    pub async fn fetch(&self) -> QueryState<T> {
        self.run(false).await
    }

    /// Bypasses a stored entry. Concurrent refetches still share one request.
    pub async fn refetch(&self) -> QueryState<T> {
        self.run(true).await
    }

    async fn run(&self, force: bool) -> QueryState<T> {
        if !self.enabled {
            debug!(key = %self.key, "Query disabled, not executed");
            return self.state();
        }

        self.state.send_modify(|state| {
            state.status = QueryStatus::Loading;
            state.error = None;
        });

        let fetcher = self.fetcher.clone();
        let lookup = self
            .cache
            .lookup(self.key.clone(), force, Box::new(move || fetcher()))
            .await;

        match lookup.result {
            Ok(body) => {
                let data = (self.selector)(&body);
                self.state.send_modify(|state| {
                    state.status = QueryStatus::Success;
                    state.data = Some(data);
                    state.error = None;
                });
            }
            Err(err) => {
                // Callers that joined someone else's fetch stay quiet.
                if lookup.source != Source::Shared {
                    self.notifier
                        .notify(Notification::error(&self.error_title, err.user_message()));
                }
                self.state.send_modify(|state| {
                    state.status = QueryStatus::Error;
                    state.error = Some(err);
                });
            }
        }
        self.state()
    }
}
