//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate for
//! any binary built on the framework.
//!
//! ## Configuration
//!
//! The subscriber uses a compact format that hides the crate/module prefix
//! (`with_target(false)`); every event carries `label`, `operation`, `family` or
//! `key` fields instead. Levels come from `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Backend calls**: endpoint, backend and status of every request (`debug`/`info`)
//! - **Cache**: hits, joined fetches, invalidations and actor start/stop
//! - **Mutations**: success with the number of invalidated entries, failures
//! - **Errors**: the translated [`ResourceError`](crate::ResourceError) of every failed call
//!
//! The API key is never recorded; [`TransportRequest`](crate::transport::TransportRequest)
//! redacts it in its `Debug` output.
//!
//! ## Usage Examples
//!
//! ```bash
//! RUST_LOG=info cargo run -p portal-sample
//! RUST_LOG=debug cargo run -p portal-sample
//! RUST_LOG=resource_framework::cache=debug cargo run -p portal-sample
//! ```
//!
//! With `RUST_LOG=debug` a cached list read followed by a create looks like:
//!
//! ```text
//! DEBUG Starting fetch key=connectors/list/{"limit":10,"page":1}/cred-5e1f0c9a2b7d4e61
//! INFO  Backend call ok label="connector" operation=list status=200
//! DEBUG Cache hit key=connectors/list/{"limit":10,"page":1}/cred-5e1f0c9a2b7d4e61
//! INFO  Backend call ok label="connector" operation=create status=200
//! INFO  Invalidated prefix=connectors removed=1
//! INFO  Mutation succeeded family="connectors" removed=1
//! ```

/// Initializes the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
