//! # Resource Errors
//!
//! This module defines the single error taxonomy used by every resource client,
//! query and mutation in the framework. By centralizing error definitions, every
//! caller gets one uniform control-flow path no matter which backend endpoint failed.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`ResourceError::MissingCredential`] | No API key is available; no network call is made |
//! | [`ResourceError::Validation`] | Local input check failed; no network call is made |
//! | [`ResourceError::Api`] | The backend answered with an HTTP error status |
//! | [`ResourceError::Network`] | No response reached us at all |
//! | [`ResourceError::EmptyResponse`] | The call succeeded but the body was empty |
//! | [`ResourceError::Unknown`] | Anything else |

use crate::envelope::extract_message;
use crate::transport::TransportError;
use serde_json::Value;

/// Fixed message used for [`ResourceError::Network`].
pub const NETWORK_MESSAGE: &str =
    "No response from the server. Check your connection and try again.";

/// Errors that can occur while talking to a resource endpoint.
///
/// The type is `Clone` because a single failed fetch is fanned out to every
/// caller waiting on the same cache key.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ResourceError {
    /// The credential store holds no API key.
    #[error("Missing API key: sign in before calling the API")]
    MissingCredential,

    /// A required field is missing or invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend returned a structured HTTP error.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never got a response.
    #[error("{}", NETWORK_MESSAGE)]
    Network,

    /// The request succeeded but carried no payload.
    #[error("No server response for {what}")]
    EmptyResponse { what: String },

    /// Catch-all with an operation-specific fallback message.
    #[error("{message}")]
    Unknown { message: String },
}

impl ResourceError {
    /// Shorthand for [`ResourceError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        ResourceError::Validation(msg.into())
    }

    /// Shorthand for [`ResourceError::Unknown`].
    pub fn unknown(msg: impl Into<String>) -> Self {
        ResourceError::Unknown {
            message: msg.into(),
        }
    }

    /// Translates a transport failure into the taxonomy.
    ///
    /// `fallback` is the operation-specific message used when nothing better
    /// can be said (e.g. "Unexpected error while creating connector").
    pub fn from_transport(err: TransportError, fallback: &str) -> Self {
        match err {
            TransportError::Http { status, body } => ResourceError::Api {
                status,
                message: api_message(status, &body),
            },
            TransportError::NoResponse(_) => ResourceError::Network,
            TransportError::Other(detail) => {
                tracing::debug!(%detail, "Unclassified transport failure");
                ResourceError::unknown(fallback)
            }
        }
    }

    /// The text shown to a person in a notification.
    ///
    /// Unlike `Display`, this leaves out the variant prefix for backend and
    /// validation errors, since the notification title already says what failed.
    pub fn user_message(&self) -> String {
        match self {
            ResourceError::Validation(msg) => msg.clone(),
            ResourceError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status code carried by [`ResourceError::Api`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ResourceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extracts the human message from an error body, falling back to the raw body.
fn api_message(status: u16, body: &Value) -> String {
    if let Some(msg) = extract_message(body) {
        return msg;
    }
    match body {
        Value::Null => format!("Request failed with status {status}"),
        Value::String(s) if s.trim().is_empty() => format!("Request failed with status {status}"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_error_extracts_message_field() {
        let err = TransportError::Http {
            status: 422,
            body: json!({ "message": "Name already taken" }),
        };
        let mapped = ResourceError::from_transport(err, "fallback");
        assert_eq!(
            mapped,
            ResourceError::Api {
                status: 422,
                message: "Name already taken".into()
            }
        );
    }

    #[test]
    fn test_http_error_checks_alternate_fields() {
        let err = TransportError::Http {
            status: 400,
            body: json!({ "error": { "message": "Bad mcc" } }),
        };
        let mapped = ResourceError::from_transport(err, "fallback");
        assert_eq!(mapped.user_message(), "Bad mcc");
        assert_eq!(mapped.status(), Some(400));
    }

    #[test]
    fn test_http_error_without_message_uses_raw_body() {
        let err = TransportError::Http {
            status: 500,
            body: json!({ "code": 17 }),
        };
        let mapped = ResourceError::from_transport(err, "fallback");
        assert_eq!(mapped.user_message(), r#"{"code":17}"#);
    }

    #[test]
    fn test_http_error_with_empty_body() {
        let err = TransportError::Http {
            status: 502,
            body: Value::Null,
        };
        let mapped = ResourceError::from_transport(err, "fallback");
        assert_eq!(mapped.user_message(), "Request failed with status 502");
    }

    #[test]
    fn test_no_response_is_network_error() {
        let err = TransportError::NoResponse("connection refused".into());
        let mapped = ResourceError::from_transport(err, "fallback");
        assert_eq!(mapped, ResourceError::Network);
        assert_eq!(mapped.user_message(), NETWORK_MESSAGE);
    }

    #[test]
    fn test_other_failure_uses_operation_fallback() {
        let err = TransportError::Other("invalid json".into());
        let mapped = ResourceError::from_transport(err, "Unexpected error while loading the role list");
        assert_eq!(mapped.user_message(), "Unexpected error while loading the role list");
    }
}
