//! # Portal Data Layer
//!
//! The SMS and billing portal's resources on top of `resource-framework`.
//!
//! - **[model]**: Open records ([`Connector`](model::Connector), [`Role`](model::Role), ...) and their payloads.
//! - **[clients]**: Typed clients, one per resource family, plus permissions and the dashboard.
//! - **[lifecycle]**: The [`Portal`](lifecycle::Portal) that wires clients, cache and credential together.

pub mod clients;
pub mod lifecycle;
pub mod model;
