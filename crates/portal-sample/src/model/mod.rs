//! Portal data models.
//!
//! Records are open: named fields plus an `extra` map that keeps whatever else
//! the backend sends, so new backend fields never break deserialization.

pub mod action;
pub mod connector;
pub mod dashboard;
pub mod document_type;
pub mod module;
pub mod role;

pub use action::*;
pub use connector::*;
pub use dashboard::*;
pub use document_type::*;
pub use module::*;
pub use role::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `12`, `"12"` and `null`; anything else reads as `None`.
pub(crate) fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Counter that may arrive as a number, a numeric string or not at all.
pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Amount that may arrive as a number or a numeric string.
pub(crate) fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_int")]
        n: Option<i64>,
        #[serde(default, deserialize_with = "lenient_count")]
        c: u64,
        #[serde(default, deserialize_with = "lenient_amount")]
        a: f64,
    }

    #[test]
    fn test_lenient_numbers() {
        let s: Sample = serde_json::from_value(json!({ "n": "310", "c": "7", "a": "1.5" })).unwrap();
        assert_eq!(s.n, Some(310));
        assert_eq!(s.c, 7);
        assert_eq!(s.a, 1.5);

        let s: Sample = serde_json::from_value(json!({ "n": null })).unwrap();
        assert_eq!(s.n, None);
        assert_eq!(s.c, 0);
    }
}
