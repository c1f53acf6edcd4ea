//! Active/inactive status as sent by the backends.
//!
//! The same field arrives as `1`/`0`, `"1"`/`"0"` or `"ACTIVE"`/`"INACTIVE"`
//! depending on the endpoint. Reads accept all of them; writes always send `1`/`0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    Active,
    #[default]
    Inactive,
}

impl Status {
    /// Interprets any of the accepted representations.
    pub fn from_value(value: &Value) -> Self {
        if is_active(value) {
            Status::Active
        } else {
            Status::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }

    /// The status a toggle should send, given the current one.
    pub fn toggled(self) -> Self {
        match self {
            Status::Active => Status::Inactive,
            Status::Inactive => Status::Active,
        }
    }

    /// Numeric wire form.
    pub fn code(self) -> u8 {
        match self {
            Status::Active => 1,
            Status::Inactive => 0,
        }
    }
}

impl From<bool> for Status {
    fn from(active: bool) -> Self {
        if active {
            Status::Active
        } else {
            Status::Inactive
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Inactive => write!(f, "inactive"),
        }
    }
}

/// True for `1`, `"1"`, `"ACTIVE"` (any case) and `true`.
pub fn is_active(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("active")
        }
        Value::Bool(b) => *b,
        _ => false,
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Status::from_value(&value))
    }
}
