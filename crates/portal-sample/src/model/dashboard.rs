//! Read-only billing dashboard metrics.
use chrono::NaiveDate;
use resource_framework::{Payload, ResourceError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{lenient_amount, lenient_count};

/// Inclusive date range, `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Payload for DateRange {
    fn validate(&self) -> Result<(), ResourceError> {
        let from = parse_iso_date(&self.from)?;
        let to = parse_iso_date(&self.to)?;
        if from > to {
            return Err(ResourceError::validation("The start date must not be after the end date"));
        }
        Ok(())
    }
}

/// Parses a calendar date written exactly as `YYYY-MM-DD`.
fn parse_iso_date(s: &str) -> Result<NaiveDate, ResourceError> {
    let invalid = || ResourceError::validation("Dates must use the YYYY-MM-DD format");
    // chrono accepts unpadded fields, the backend does not.
    if s.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_messages: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub delivered: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub failed: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub revenue: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardSummary {
    /// Delivered share of all messages, `0.0` when nothing was sent.
    pub fn delivery_rate(&self) -> f64 {
        if self.total_messages == 0 {
            0.0
        } else {
            self.delivered as f64 / self.total_messages as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficPoint {
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub sent: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub delivered: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub failed: u64,
}
