//! # Resource Framework
//!
//! This crate provides the building blocks of the portal's data layer: a
//! type-safe client for REST resources, a de-duplicating query cache run as an
//! actor, and guarded mutations that keep the cache consistent after writes.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into four layers:
//!
//! 1. **Resource Layer** ([`Resource`]) - what an entity looks like and where it lives
//! 2. **Client Layer** ([`ResourceClient`], [`ApiClient`]) - one call in, one raw envelope or one [`ResourceError`] out
//! 3. **Cache Layer** ([`cache::CacheActor`]) - exclusive owner of every cached response, bounded in count and age
//! 4. **Hook Layer** ([`Query`], [`Mutation`]) - normalized reads and guarded writes with notifications
//!
//! You describe a resource **once** with the [`Resource`] trait; the framework
//! handles the credential gate, error translation, envelope normalization,
//! caching, de-duplication and invalidation.
//!
//! ## Core Abstractions
//!
//! ### [`Resource`] - The Entity Contract
//!
//! Associated constants name the cache family, the endpoints and the envelope
//! keys; associated types pin the create and update payloads:
//!
//! ```rust
//! use resource_framework::{Api, Endpoints, Method, Payload, Resource, ResourceError, ResourceId, Status};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Deserialize)]
//! struct Module {
//!     id: Option<ResourceId>,
//!     name: String,
//!     #[serde(default)]
//!     status: Status,
//! }
//!
//! #[derive(Debug, Serialize)]
//! struct ModuleCreate { name: String }
//!
//! impl Payload for ModuleCreate {
//!     fn validate(&self) -> Result<(), ResourceError> {
//!         resource_framework::resource::require_text("Name", &self.name)
//!     }
//! }
//!
//! impl Resource for Module {
//!     const FAMILY: &'static str = "modules";
//!     const LABEL: &'static str = "module";
//!     const PLURAL_KEY: Option<&'static str> = Some("modules");
//!     const ID_ALIASES: &'static [&'static str] = &["module_id"];
//!     const ENDPOINTS: Endpoints = Endpoints {
//!         api: Api::Sms,
//!         read_method: Method::Post,
//!         list: "/modules/list",
//!         get: "/modules/get",
//!         create: "/modules/create",
//!         update: "/modules/update",
//!         delete: "/modules/delete",
//!         change_status: "/modules/change-status",
//!         page_size_key: "limit",
//!     };
//!     type Create = ModuleCreate;
//!     type Update = ModuleCreate;
//!
//!     fn id(&self) -> Option<ResourceId> { self.id.clone() }
//!     fn status(&self) -> Status { self.status }
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - The cache is the only shared mutable state and is owned by one actor task (no locks)
//! - Fetches run in their own tasks and report back through the actor's channel
//! - Concurrent reads of one key share a single request
//! - Writes carry no cross-write ordering; the last completion drives the final invalidation
//!
//! ## Testing
//!
//! The [`mock`] module provides [`mock::MockTransport`], an in-memory [`Transport`]
//! with fluent expectations and per-endpoint call counters, and
//! [`mock::RecordingNotifier`] for asserting on user notifications.

pub mod api_client;
pub mod cache;
pub mod client;
pub mod config;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod mutation;
pub mod notify;
pub mod params;
pub mod query;
pub mod resource;
pub mod resource_queries;
pub mod status;
pub mod tracing;
pub mod transport;

// Re-export core types for convenience
pub use api_client::ApiClient;
pub use cache::{CacheActor, CacheLimits, CacheStats, QueryCache, QueryKey};
pub use client::{ApiCaller, Call, Operation, ResourceClient};
pub use config::{ClientConfig, ConfigError};
pub use credential::{CredentialStore, SessionCredential};
pub use error::ResourceError;
pub use mutation::{Mutation, MutationMessages};
pub use notify::{Notification, Notifier, Variant};
pub use params::{ListParams, SortOrder};
pub use query::{Query, QueryClient, QueryState, QueryStatus};
pub use resource::{Endpoints, Payload, Resource, ResourceId};
pub use resource_queries::{query_key, ResourceQueries};
pub use status::Status;
pub use transport::{Api, HttpTransport, Method, Transport, TransportError};
