//! # Envelope Normalization
//!
//! The portal backends wrap the same logical payload in different envelopes
//! depending on the endpoint. This module turns any accepted envelope into one
//! canonical shape before the data reaches a consumer.
//!
//! List extraction is an ordered chain of pure functions; the first one that
//! yields an array wins and an unrecognized envelope yields an empty list:
//!
//! 1. `data[]`
//! 2. `data.data[]`
//! 3. `<plural>[]` (e.g. `types`, `modules`)
//! 4. `message[]`
//! 5. `message.data[]`
//! 6. `message.<plural>[]`
//! 7. a bare top-level array
//!
//! The same order is used for every list resource in the workspace.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

type ListShape = for<'a> fn(&'a Value, Option<&str>) -> Option<&'a Vec<Value>>;

const LIST_SHAPES: &[(&str, ListShape)] = &[
    ("data", data_array),
    ("data.data", data_data_array),
    ("plural", plural_array),
    ("message", message_array),
    ("message.data", message_data_array),
    ("message.plural", message_plural_array),
    ("bare", bare_array),
];

fn data_array<'a>(env: &'a Value, _: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get("data")?.as_array()
}

fn data_data_array<'a>(env: &'a Value, _: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get("data")?.get("data")?.as_array()
}

fn plural_array<'a>(env: &'a Value, plural: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get(plural?)?.as_array()
}

fn message_array<'a>(env: &'a Value, _: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get("message")?.as_array()
}

fn message_data_array<'a>(env: &'a Value, _: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get("message")?.get("data")?.as_array()
}

fn message_plural_array<'a>(env: &'a Value, plural: Option<&str>) -> Option<&'a Vec<Value>> {
    env.get("message")?.get(plural?)?.as_array()
}

fn bare_array<'a>(env: &'a Value, _: Option<&str>) -> Option<&'a Vec<Value>> {
    env.as_array()
}

/// Extracts the record list from a list envelope. Never fails.
pub fn normalize_list(envelope: &Value, plural: Option<&str>) -> Vec<Value> {
    LIST_SHAPES
        .iter()
        .find_map(|(_, shape)| shape(envelope, plural))
        .cloned()
        .unwrap_or_default()
}

/// Name of the shape that matched, for diagnostics.
pub fn matched_shape(envelope: &Value, plural: Option<&str>) -> Option<&'static str> {
    LIST_SHAPES
        .iter()
        .find(|(_, shape)| shape(envelope, plural).is_some())
        .map(|(name, _)| *name)
}

/// Extracts and deserializes a list of records, skipping records that don't fit `R`.
pub fn normalize_records<R: DeserializeOwned>(envelope: &Value, plural: Option<&str>) -> Vec<R> {
    normalize_list(envelope, plural)
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<R>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping record that does not match the expected shape");
                None
            }
        })
        .collect()
}

/// Extracts a single record from a detail envelope.
///
/// Tries `data{}`, `data.data{}`, `message{}`, `message.data{}`, then a
/// one-element list in any list shape, then the envelope itself when it
/// carries one of `id_keys`.
pub fn normalize_record(envelope: &Value, plural: Option<&str>, id_keys: &[&str]) -> Option<Value> {
    let nested = [
        envelope.get("data"),
        envelope.get("data").and_then(|d| d.get("data")),
        envelope.get("message"),
        envelope.get("message").and_then(|m| m.get("data")),
    ];
    if let Some(record) = nested
        .into_iter()
        .flatten()
        .find(|v| v.as_object().is_some_and(|o| !is_wrapper(o)))
    {
        return Some(record.clone());
    }

    let list = normalize_list(envelope, plural);
    if list.len() == 1 {
        return list.into_iter().next();
    }

    let obj = envelope.as_object()?;
    let has_id = std::iter::once("id")
        .chain(id_keys.iter().copied())
        .any(|k| obj.contains_key(k));
    has_id.then(|| envelope.clone())
}

fn is_wrapper(obj: &Map<String, Value>) -> bool {
    matches!(obj.get("data"), Some(Value::Object(_)) | Some(Value::Array(_)))
}

/// Finds a human-readable message in a response or error body.
///
/// Checks `message`, `error` (string or `error.message`), `detail`, `msg`,
/// `error_description` and `errors` (first entry of an array or of an object's
/// field lists), in that order.
pub fn extract_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    for key in ["message", "error", "detail", "msg", "error_description"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    if !s.trim().is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            _ => {}
        }
    }

    match obj.get("errors")? {
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(fields) => fields.values().find_map(first_text),
        _ => None,
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(obj) => obj.get("message").and_then(first_text),
        _ => None,
    }
}

/// True for `null`, blank strings and empty objects.
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}
