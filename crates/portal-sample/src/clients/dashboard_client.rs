//! # Dashboard Client
//!
//! Read-only billing metrics. The dashboard isn't a CRUD resource, so this
//! client talks to the [`ApiCaller`] directly instead of wrapping a
//! `ResourceClient`.
use crate::model::{DashboardSummary, DateRange, TrafficPoint};
use resource_framework::client::Call;
use resource_framework::envelope::{normalize_record, normalize_records};
use resource_framework::{Api, ApiCaller, Method, Operation, Payload, ResourceError};
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub const FAMILY: &str = "dashboard";
pub const SUMMARY: Operation = Operation::Custom("summary");
pub const TRAFFIC: Operation = Operation::Custom("traffic");

const SUMMARY_ENDPOINT: &str = "/dashboard/summary";
const TRAFFIC_ENDPOINT: &str = "/dashboard/traffic";

#[derive(Clone)]
pub struct DashboardClient {
    caller: ApiCaller,
}

impl DashboardClient {
    pub fn new(caller: ApiCaller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &ApiCaller {
        &self.caller
    }

    /// Totals for the range; returns the raw envelope.
    #[instrument(skip(self))]
    pub async fn summary(&self, range: &DateRange) -> Result<Value, ResourceError> {
        self.read(SUMMARY, SUMMARY_ENDPOINT, range).await
    }

    /// Daily traffic for the range; returns the raw envelope.
    #[instrument(skip(self))]
    pub async fn traffic(&self, range: &DateRange) -> Result<Value, ResourceError> {
        self.read(TRAFFIC, TRAFFIC_ENDPOINT, range).await
    }

    async fn read(&self, operation: Operation, endpoint: &'static str, range: &DateRange) -> Result<Value, ResourceError> {
        range.validate()?;
        let data = serde_json::to_value(range).map_err(|_| ResourceError::unknown(operation.fallback_message(FAMILY)))?;
        debug!("Sending request");
        self.caller
            .call(Call {
                operation,
                label: FAMILY,
                api: Api::Billing,
                method: Method::Get,
                endpoint,
                data,
            })
            .await
    }
}

/// Unwraps a summary envelope; unknown shapes read as an empty summary.
pub fn parse_summary(body: &Value) -> DashboardSummary {
    let record = normalize_record(body, None, &["total_messages"]).unwrap_or_else(|| body.clone());
    serde_json::from_value(record).unwrap_or_else(|e| {
        warn!(error = %e, "Dashboard summary does not match the expected shape");
        DashboardSummary::default()
    })
}

/// Unwraps a traffic envelope (`data`, `traffic`, `message`, ... or a bare array).
pub fn parse_traffic(body: &Value) -> Vec<TrafficPoint> {
    normalize_records(body, Some("traffic"))
}
