//! # Transport
//!
//! The HTTP boundary of the framework. Everything above this module speaks in
//! [`TransportRequest`]s and raw JSON envelopes; everything below it is `reqwest`.
//!
//! The [`Transport`] trait is the seam used by tests: [`crate::mock::MockTransport`]
//! implements it in memory, [`HttpTransport`] implements it against the real APIs.

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP verb used by the portal backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// The backend a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    Sms,
    Billing,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Api::Sms => write!(f, "sms"),
            Api::Billing => write!(f, "billing"),
        }
    }
}

/// One call to a backend endpoint.
#[derive(Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub api: Api,
    pub endpoint: String,
    pub data: Value,
    pub credential: Option<String>,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("api", &self.api)
            .field("endpoint", &self.endpoint)
            .field("data", &self.data)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A successful response. An empty body is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// Failures reported by a transport.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("http {status}: {body}")]
    Http { status: u16, body: Value },
    /// No response was received (connect failure, timeout, reset).
    #[error("no response: {0}")]
    NoResponse(String),
    /// Anything else (body decoding, client construction).
    #[error("transport error: {0}")]
    Other(String),
}

/// Sends requests to a backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport for the SMS and billing APIs.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    sms_base: String,
    billing_base: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("resource-framework/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            http,
            sms_base: trim_base(&config.sms_api_url),
            billing_base: trim_base(&config.billing_api_url),
        })
    }

    fn url(&self, api: Api, endpoint: &str) -> String {
        let base = match api {
            Api::Sms => &self.sms_base,
            Api::Billing => &self.billing_base,
        };
        format!("{}/{}", base, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url(request.api, &request.endpoint);
        debug!(method = ?request.method, %url, "Sending request");

        let builder = match request.method {
            Method::Get => self.http.get(&url).query(&query_pairs(&request.data)),
            Method::Post => self.http.post(&url).json(&request.data),
        };
        let builder = match &request.credential {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        };

        let res = builder.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(map_reqwest_error)?;
        let body = parse_body(&bytes);

        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            warn!(%url, status = status.as_u16(), "Backend returned an error status");
            Err(TransportError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        TransportError::NoResponse(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

/// Decodes a body as JSON, keeping non-JSON text as a string value.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Flattens a JSON object into query-string pairs. Nulls are dropped.
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Some(map) = data.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k.clone(), s.clone())),
            other => Some((k.clone(), other.to_string())),
        })
        .collect()
}
