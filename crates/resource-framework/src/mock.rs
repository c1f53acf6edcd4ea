//! # Mock Framework & Testing Guide
//!
//! [`MockTransport`] implements the same [`Transport`] trait as the production
//! [`HttpTransport`](crate::transport::HttpTransport) but answers entirely in
//! memory from expectations you register up front. [`RecordingNotifier`] keeps
//! every notification so tests can assert on exactly what a person would see.
//!
//! ## When to use the mock vs a real backend
//!
//! | Feature | MockTransport | HttpTransport |
//! |---------|---------------|---------------|
//! | **Speed** | Instant (in-memory) | Network bound |
//! | **Determinism** | Deterministic (optional fixed latency) | Subject to the backend |
//! | **Call counting** | Per endpoint | None |
//! | **Error Injection** | Easy (`return_err`) | Hard |
//!
//! ## Example
//!
//! ```rust
//! use resource_framework::mock::MockTransport;
//! use resource_framework::transport::{Api, Method, Transport, TransportError, TransportRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_post("/connectors/list")
//!         .return_ok(json!({ "data": [] }));
//!     mock.expect_post("/connectors/create")
//!         .return_err(TransportError::NoResponse("connection refused".into()));
//!
//!     let request = TransportRequest {
//!         method: Method::Post,
//!         api: Api::Sms,
//!         endpoint: "/connectors/list".into(),
//!         data: json!({}),
//!         credential: Some("key".into()),
//!     };
//!     let response = mock.request(request).await.unwrap();
//!     assert_eq!(response.body, json!({ "data": [] }));
//!     assert_eq!(mock.calls("/connectors/list"), 1);
//! }
//! ```
//!
//! ## Expectation semantics
//!
//! Expectations are matched by method and endpoint. Responses registered with
//! `return_ok`/`return_err` are consumed in order; `always_ok` answers every
//! later call. A request with no matching expectation fails with
//! [`TransportError::Other`] and is remembered so [`MockTransport::verify`]
//! can report it.

use crate::notify::{Notification, Notifier, Variant};
use crate::transport::{Method, Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Route = (Method, String);

#[derive(Default)]
struct Responses {
    queued: VecDeque<Result<Value, TransportError>>,
    sticky: Option<Result<Value, TransportError>>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<Route, Responses>,
    requests: Vec<TransportRequest>,
    unexpected: Vec<TransportRequest>,
}

/// In-memory transport with expectation tracking for fluent testing.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response, so concurrent callers really overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Expects a POST to `endpoint`.
    pub fn expect_post(&self, endpoint: &str) -> ExpectationBuilder {
        self.expect(Method::Post, endpoint)
    }

    /// Expects a GET to `endpoint`.
    pub fn expect_get(&self, endpoint: &str) -> ExpectationBuilder {
        self.expect(Method::Get, endpoint)
    }

    fn expect(&self, method: Method, endpoint: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            route: (method, endpoint.to_string()),
            state: self.state.clone(),
        }
    }

    /// Number of requests received for `endpoint`, any method.
    pub fn calls(&self, endpoint: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.requests.iter().filter(|r| r.endpoint == endpoint).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// The most recent request to `endpoint`.
    pub fn last_request(&self, endpoint: &str) -> Option<TransportRequest> {
        let state = self.state.lock().unwrap();
        state.requests.iter().rev().find(|r| r.endpoint == endpoint).cloned()
    }

    /// Verifies that all queued expectations were consumed and nothing unexpected arrived.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if let Some(request) = state.unexpected.first() {
            panic!("Unexpected request: {request:?}");
        }
        let remaining: usize = state.routes.values().map(|r| r.queued.len()).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let route = (request.method, request.endpoint.clone());
            let response = state.routes.get_mut(&route).and_then(|r| match r.queued.pop_front() {
                Some(response) => Some(response),
                None => r.sticky.clone(),
            });
            if response.is_none() {
                state.unexpected.push(request.clone());
            }
            response
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match response {
            Some(Ok(body)) => Ok(TransportResponse { status: 200, body }),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::Other(format!(
                "no expectation for {:?} {}",
                request.method, request.endpoint
            ))),
        }
    }
}

/// Builder for one endpoint's expectation.
pub struct ExpectationBuilder {
    route: Route,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Answers the next matching request with `body`.
    pub fn return_ok(self, body: Value) {
        self.queue(Ok(body));
    }

    /// Fails the next matching request with `err`.
    pub fn return_err(self, err: TransportError) {
        self.queue(Err(err));
    }

    /// Answers every matching request that finds no queued response with `body`.
    pub fn always_ok(self, body: Value) {
        let mut state = self.state.lock().unwrap();
        state.routes.entry(self.route).or_default().sticky = Some(Ok(body));
    }

    fn queue(self, response: Result<Value, TransportError>) {
        let mut state = self.state.lock().unwrap();
        state.routes.entry(self.route).or_default().queued.push_back(response);
    }
}

/// Notifier that records everything it is given.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, variant: Variant) -> usize {
        self.sent.lock().unwrap().iter().filter(|n| n.variant == variant).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}
