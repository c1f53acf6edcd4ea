//! # Portal Lifecycle & Orchestration
//!
//! Builds the data layer once at start-up and tears it down at exit.
//!
//! ## The Portal Pattern
//!
//! [`Portal`] owns everything that lives for the whole session:
//!
//! 1. **Cache actor** - spawned in [`Portal::with_parts`]; its handle is kept for shutdown
//! 2. **Credential** - a set-once [`SessionCredential`](resource_framework::SessionCredential)
//! 3. **Domain clients** - one per resource family, all sharing one `ApiCaller`
//! 4. **Builders** - `connectors_query`, `create_connector`, `toggle_role_status`, ...
//!
//! ```rust,ignore
//! let portal = Portal::new(&ClientConfig::from_env()?)?;
//!
//! let roles = portal.roles_query(ListParams::default(), true);
//! roles.fetch().await;
//!
//! drop(roles);
//! portal.shutdown().await?;
//! ```
//!
//! ## Graceful Shutdown
//!
//! The cache actor stops when the last [`QueryCache`](resource_framework::QueryCache)
//! handle is dropped:
//!
//! 1. **Drop queries and mutations** - each holds a cache handle
//! 2. **Call `shutdown`** - drops the portal's own handles
//! 3. **Await completion** - the actor sees its channel close and exits
//!
//! Fetches still running when the channel closes finish on their own; their
//! results are discarded.
//!
//! ## Observability
//!
//! Tracing is set up by [`resource_framework::tracing::setup_tracing`]:
//!
//! ```bash
//! RUST_LOG=info cargo run -p portal-sample     # Compact logs
//! RUST_LOG=debug cargo run -p portal-sample    # Cache hits, request routing
//! ```

pub mod portal;

pub use portal::*;
