//! # Query Cache Actor
//!
//! The `CacheActor` is the single owner of every cached response in the process.
//! Like any actor it processes its messages sequentially, so the pending table
//! and the in-flight table need no locks.
//!
//! ## Storage
//!
//! Settled values live in a [`moka`] cache bounded by [`CacheLimits`]: at most
//! `capacity` entries, each dropped `time_to_live` after it was written. An
//! evicted or expired entry is simply fetched again on the next read.
//!
//! ## Keys
//!
//! A [`QueryKey`] is a list of segments, conventionally
//! `[family, operation, params, credential]`. Invalidation works on prefixes:
//! `["connectors"]` drops every connector entry, while a full key drops one.
//!
//! ## De-duplication
//!
//! The first `Fetch` for a key starts the fetcher in its own task and marks the
//! entry pending. Every further `Fetch` for that key (forced or not) joins the
//! waiter list of the running fetch instead of starting another one. When the
//! task finishes it reports back with a `Complete` message and the actor fans
//! the result out to all waiters.
//!
//! A success is stored only if the key still belongs to that fetch, so an
//! invalidation that lands mid-flight is never undone. Errors are never stored.
//! A fetcher that panics completes its waiters with an error.
//!
//! ## Shutdown
//!
//! The actor keeps only a weak sender to itself. Once every [`QueryCache`]
//! handle is dropped the channel closes and `run` returns.

use crate::error::ResourceError;
use futures::future::BoxFuture;
use futures::FutureExt;
use moka::future::Cache;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Future produced by a fetcher.
pub type FetchFuture = BoxFuture<'static, Result<Value, ResourceError>>;

/// Deferred network call; only invoked when the cache really needs to fetch.
pub type Fetcher = Box<dyn FnOnce() -> FetchFuture + Send>;

type Reply = oneshot::Sender<Lookup>;

/// Where a cached read got its answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A stored entry.
    Cache,
    /// A fetch started for this request.
    Network,
    /// A fetch another request had already started.
    Shared,
}

/// Result of [`QueryCache::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub result: Result<Value, ResourceError>,
    pub source: Source,
}

/// Structured cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Key covering a whole resource family.
    pub fn family(family: &str) -> Self {
        Self(vec![family.to_string()])
    }

    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Bounds on the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Maximum number of stored values.
    pub capacity: u64,
    /// How long a stored value is served after it was written.
    pub time_to_live: Duration,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            time_to_live: Duration::from_secs(5 * 60),
        }
    }
}

/// Counters reported by [`QueryCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored values; running fetches are counted in `in_flight`.
    pub entries: usize,
    pub in_flight: usize,
    /// Fetchers actually started (network calls).
    pub fetches_started: u64,
    /// Requests answered by joining a running fetch.
    pub deduplicated: u64,
    /// Requests answered straight from a stored entry.
    pub hits: u64,
    /// Entries removed by invalidation.
    pub invalidated: u64,
}

enum CacheRequest {
    Fetch {
        key: QueryKey,
        force: bool,
        fetcher: Fetcher,
        respond_to: Reply,
    },
    Invalidate {
        prefix: QueryKey,
        respond_to: oneshot::Sender<usize>,
    },
    Complete {
        key: QueryKey,
        fetch_id: u64,
        result: Result<Value, ResourceError>,
    },
    Stats {
        respond_to: oneshot::Sender<CacheStats>,
    },
}

struct InFlight {
    key: QueryKey,
    waiters: Vec<Reply>,
}

/// The server half of the query cache.
pub struct CacheActor {
    receiver: mpsc::Receiver<CacheRequest>,
    sender: mpsc::WeakSender<CacheRequest>,
    stored: Cache<QueryKey, Value>,
    /// Key -> id of the fetch currently responsible for it.
    pending: HashMap<QueryKey, u64>,
    in_flight: HashMap<u64, InFlight>,
    next_fetch_id: u64,
    stats: CacheStats,
}

impl CacheActor {
    /// Creates the actor and its first handle. The actor must be run via [`CacheActor::run`].
    pub fn new(buffer_size: usize) -> (Self, QueryCache) {
        Self::with_limits(buffer_size, CacheLimits::default())
    }

    /// Like [`CacheActor::new`], with explicit storage bounds.
    pub fn with_limits(buffer_size: usize, limits: CacheLimits) -> (Self, QueryCache) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let stored = Cache::builder()
            .max_capacity(limits.capacity)
            .time_to_live(limits.time_to_live)
            .build();
        let actor = Self {
            receiver,
            sender: sender.downgrade(),
            stored,
            pending: HashMap::new(),
            in_flight: HashMap::new(),
            next_fetch_id: 1,
            stats: CacheStats::default(),
        };
        (actor, QueryCache { sender })
    }

    pub async fn run(mut self) {
        info!(capacity = ?self.stored.policy().max_capacity(), "Cache actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Fetch {
                    key,
                    force,
                    fetcher,
                    respond_to,
                } => self.handle_fetch(key, force, fetcher, respond_to).await,
                CacheRequest::Complete {
                    key,
                    fetch_id,
                    result,
                } => self.handle_complete(key, fetch_id, result).await,
                CacheRequest::Invalidate { prefix, respond_to } => {
                    let removed = self.invalidate(&prefix).await;
                    self.stats.invalidated += removed as u64;
                    info!(%prefix, removed, "Invalidated");
                    let _ = respond_to.send(removed);
                }
                CacheRequest::Stats { respond_to } => {
                    // Apply pending evictions so the count is exact.
                    self.stored.run_pending_tasks().await;
                    let mut stats = self.stats;
                    stats.entries = self.stored.entry_count() as usize;
                    stats.in_flight = self.in_flight.len();
                    let _ = respond_to.send(stats);
                }
            }
        }

        info!(entries = self.stored.entry_count(), "Cache actor stopped");
    }

    async fn handle_fetch(&mut self, key: QueryKey, force: bool, fetcher: Fetcher, respond_to: Reply) {
        if let Some(fetch_id) = self.pending.get(&key) {
            if let Some(flight) = self.in_flight.get_mut(fetch_id) {
                self.stats.deduplicated += 1;
                debug!(%key, fetch_id, waiters = flight.waiters.len() + 1, "Joined running fetch");
                flight.waiters.push(respond_to);
                return;
            }
        }
        if !force {
            if let Some(value) = self.stored.get(&key).await {
                self.stats.hits += 1;
                debug!(%key, "Cache hit");
                let _ = respond_to.send(Lookup {
                    result: Ok(value),
                    source: Source::Cache,
                });
                return;
            }
        }
        self.start_fetch(key, fetcher, respond_to).await;
    }

    /// Removes stored and pending keys under `prefix`; returns how many keys went away.
    async fn invalidate(&mut self, prefix: &QueryKey) -> usize {
        let stored: Vec<QueryKey> = self
            .stored
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();
        for key in &stored {
            self.stored.invalidate(key).await;
        }

        let before = self.pending.len();
        self.pending.retain(|key, _| !key.starts_with(prefix));

        stored.len() + before - self.pending.len()
    }

    async fn start_fetch(&mut self, key: QueryKey, fetcher: Fetcher, respond_to: Reply) {
        let fetch_id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.stats.fetches_started += 1;

        let Some(sender) = self.sender.upgrade() else {
            // Every handle is gone; nobody can observe the result.
            let _ = respond_to.send(Lookup {
                result: Err(closed()),
                source: Source::Network,
            });
            return;
        };

        debug!(%key, fetch_id, "Starting fetch");
        // The new fetch supersedes any stored value for the key.
        self.stored.invalidate(&key).await;
        self.pending.insert(key.clone(), fetch_id);
        self.in_flight.insert(
            fetch_id,
            InFlight {
                key: key.clone(),
                waiters: vec![respond_to],
            },
        );

        let weak = sender.downgrade();
        drop(sender);
        tokio::spawn(async move {
            let result = match AssertUnwindSafe(async move { fetcher().await }).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!(%key, fetch_id, "Fetcher panicked");
                    Err(ResourceError::unknown("The request failed unexpectedly"))
                }
            };
            if let Some(sender) = weak.upgrade() {
                let _ = sender
                    .send(CacheRequest::Complete {
                        key,
                        fetch_id,
                        result,
                    })
                    .await;
            }
        });
    }

    async fn handle_complete(&mut self, key: QueryKey, fetch_id: u64, result: Result<Value, ResourceError>) {
        let current = self.pending.get(&key) == Some(&fetch_id);
        if current {
            self.pending.remove(&key);
        }

        match &result {
            Ok(value) if current => self.stored.insert(key.clone(), value.clone()).await,
            Ok(_) => debug!(%key, fetch_id, "Entry replaced or invalidated during fetch, result not stored"),
            Err(e) => warn!(%key, fetch_id, error = %e, "Fetch failed"),
        }

        let Some(flight) = self.in_flight.remove(&fetch_id) else {
            warn!(%key, fetch_id, "Completion for unknown fetch");
            return;
        };
        debug!(key = %flight.key, fetch_id, waiters = flight.waiters.len(), "Fetch complete");
        // The first waiter is the request that started the fetch.
        for (i, waiter) in flight.waiters.into_iter().enumerate() {
            let source = if i == 0 { Source::Network } else { Source::Shared };
            let _ = waiter.send(Lookup {
                result: result.clone(),
                source,
            });
        }
    }
}

/// Cloneable handle to the cache actor.
#[derive(Clone)]
pub struct QueryCache {
    sender: mpsc::Sender<CacheRequest>,
}

impl QueryCache {
    /// Returns the stored value for `key`, joins a running fetch, or starts `fetcher`.
    ///
    /// With `force` a stored value is ignored, but a running fetch is still joined.
    pub async fn fetch(&self, key: QueryKey, force: bool, fetcher: Fetcher) -> Result<Value, ResourceError> {
        self.lookup(key, force, fetcher).await.result
    }

    /// Like [`QueryCache::fetch`], also reporting where the answer came from.
    pub async fn lookup(&self, key: QueryKey, force: bool, fetcher: Fetcher) -> Lookup {
        let (respond_to, response) = oneshot::channel();
        let request = CacheRequest::Fetch {
            key,
            force,
            fetcher,
            respond_to,
        };
        if self.sender.send(request).await.is_err() {
            return Lookup {
                result: Err(closed()),
                source: Source::Network,
            };
        }
        response.await.unwrap_or_else(|_| Lookup {
            result: Err(dropped()),
            source: Source::Network,
        })
    }

    /// Drops every entry under `prefix` and returns how many were removed.
    pub async fn invalidate(&self, prefix: QueryKey) -> Result<usize, ResourceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CacheRequest::Invalidate { prefix, respond_to })
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())
    }

    pub async fn stats(&self) -> Result<CacheStats, ResourceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CacheRequest::Stats { respond_to })
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())
    }
}

fn closed() -> ResourceError {
    ResourceError::unknown("Query cache is not running")
}

fn dropped() -> ResourceError {
    ResourceError::unknown("Query cache dropped the request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_fetcher(calls: Arc<AtomicUsize>, result: Result<Value, ResourceError>) -> Fetcher {
        Box::new(move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                result
            }
            .boxed()
        })
    }

    fn start() -> (QueryCache, tokio::task::JoinHandle<()>) {
        let (actor, cache) = CacheActor::new(16);
        (cache, tokio::spawn(actor.run()))
    }

    #[test]
    fn test_key_prefix() {
        let key = QueryKey::new(["connectors", "list", "{}", "k"]);
        assert!(key.starts_with(&QueryKey::family("connectors")));
        assert!(!key.starts_with(&QueryKey::family("roles")));
        assert_eq!(key.to_string(), "connectors/list/{}/k");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_call() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["connectors", "list"]);

        let (a, b) = tokio::join!(
            cache.lookup(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!([1])))),
            cache.lookup(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!([2])))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.result.unwrap(), json!([1]));
        assert_eq!(a.source, Source::Network);
        assert_eq!(b.result.unwrap(), json!([1]));
        assert_eq!(b.source, Source::Shared);
        assert_eq!(cache.stats().await.unwrap().deduplicated, 1);
    }

    #[tokio::test]
    async fn test_cached_value_served_until_forced() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["roles", "list"]);

        cache
            .fetch(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!(1))))
            .await
            .unwrap();
        let hit = cache
            .fetch(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!(2))))
            .await
            .unwrap();
        assert_eq!(hit, json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let forced = cache
            .fetch(key, true, counting_fetcher(calls.clone(), Ok(json!(3))))
            .await
            .unwrap();
        assert_eq!(forced, json!(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["modules", "list"]);

        let err = cache
            .fetch(key.clone(), false, counting_fetcher(calls.clone(), Err(ResourceError::Network)))
            .await;
        assert_eq!(err, Err(ResourceError::Network));

        let ok = cache
            .fetch(key, false, counting_fetcher(calls.clone(), Ok(json!("ok"))))
            .await;
        assert_eq!(ok.unwrap(), json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_family_prefix() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        for key in [
            QueryKey::new(["connectors", "list", "a"]),
            QueryKey::new(["connectors", "detail", "1"]),
            QueryKey::new(["roles", "list", "a"]),
        ] {
            cache
                .fetch(key, false, counting_fetcher(calls.clone(), Ok(json!(0))))
                .await
                .unwrap();
        }

        let removed = cache.invalidate(QueryKey::family("connectors")).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_is_not_undone() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["actions", "list"]);

        let pending = {
            let cache = cache.clone();
            let key = key.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.fetch(key, false, counting_fetcher(calls, Ok(json!("old")))).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate(QueryKey::family("actions")).await.unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), json!("old"));
        assert_eq!(cache.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_panicking_fetcher_fails_its_waiters() {
        let (cache, _handle) = start();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["connectors", "list"]);
        async fn explode() -> Result<Value, ResourceError> {
            panic!("fetcher blew up")
        }
        let panicking: Fetcher = Box::new(|| explode().boxed());

        let (first, joined) = tokio::time::timeout(Duration::from_secs(1), async {
            tokio::join!(
                cache.lookup(key.clone(), false, panicking),
                cache.lookup(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!(0)))),
            )
        })
        .await
        .expect("waiters were answered");
        assert!(first.result.is_err());
        assert!(joined.result.is_err());
        assert_eq!(joined.source, Source::Shared);

        let retried = tokio::time::timeout(
            Duration::from_secs(1),
            cache.fetch(key, true, counting_fetcher(calls.clone(), Ok(json!("ok")))),
        )
        .await
        .expect("key is usable again");
        assert_eq!(retried.unwrap(), json!("ok"));
        assert_eq!(cache.stats().await.unwrap().in_flight, 0);
    }

    #[tokio::test]
    async fn test_stored_values_are_bounded() {
        let limits = CacheLimits {
            capacity: 2,
            ..CacheLimits::default()
        };
        let (actor, cache) = CacheActor::with_limits(16, limits);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));

        for page in 0..6 {
            let key = QueryKey::new(["connectors", "list"]).push(page.to_string());
            cache
                .fetch(key, false, counting_fetcher(calls.clone(), Ok(json!(page))))
                .await
                .unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.fetches_started, 6);
        assert!(stats.entries <= 2, "{} entries stored", stats.entries);
    }

    #[tokio::test]
    async fn test_expired_values_are_fetched_again() {
        let limits = CacheLimits {
            time_to_live: Duration::from_millis(50),
            ..CacheLimits::default()
        };
        let (actor, cache) = CacheActor::with_limits(16, limits);
        tokio::spawn(actor.run());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(["roles", "list"]);

        cache
            .fetch(key.clone(), false, counting_fetcher(calls.clone(), Ok(json!(1))))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let fresh = cache
            .fetch(key, false, counting_fetcher(calls.clone(), Ok(json!(2))))
            .await
            .unwrap();

        assert_eq!(fresh, json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_actor_stops_when_handles_dropped() {
        let (cache, handle) = start();
        drop(cache);
        handle.await.unwrap();
    }
}
