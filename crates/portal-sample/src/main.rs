//! # Portal Sample
//!
//! Walks through a short session against the configured backends:
//! 1.  Loading configuration from the environment (and `.env`).
//! 2.  Building the [`Portal`].
//! 3.  Creating a connector, then reading the connector list through the cache.
//! 4.  Loading this month's dashboard summary.
//!
//! Set `PORTAL_API_KEY` to run signed in; otherwise every call stops at the
//! credential gate.

use portal_sample::lifecycle::Portal;
use portal_sample::model::{ConnectorCreate, DateRange};
use resource_framework::tracing::setup_tracing;
use resource_framework::{ClientConfig, ListParams};
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = ClientConfig::from_env().map_err(|e| e.to_string())?;
    info!(sms = %config.sms_api_url, billing = %config.billing_api_url, "Starting portal");

    let portal = Portal::new(&config).map_err(|e| e.to_string())?;
    if !portal.is_signed_in() {
        warn!(var = %config.credential_env, "No API key configured; requests will be refused");
    }

    let span = tracing::info_span!("connector_creation");
    async {
        let create = portal.create_connector();
        match create.mutate_async(ConnectorCreate::new("Sample route", 310, 260)).await {
            Ok(_) => info!("Connector created"),
            Err(e) => error!(error = %e, "Connector creation failed"),
        }
    }
    .instrument(span)
    .await;

    let span = tracing::info_span!("connector_listing");
    async {
        let connectors = portal.connectors_query(ListParams::default(), true);
        let state = connectors.fetch().await;
        match (&state.data, &state.error) {
            (_, Some(e)) => error!(error = %e, "Could not list connectors"),
            (Some(list), None) => info!(count = list.len(), "Connectors loaded"),
            (None, None) => info!(status = ?state.status, "Connector list not loaded"),
        }
    }
    .instrument(span)
    .await;

    let summary = portal.dashboard_summary_query(DateRange::new("2026-10-01", "2026-10-31"));
    let state = summary.fetch().await;
    if let Some(summary) = &state.data {
        info!(
            total = summary.total_messages,
            delivery_rate = summary.delivery_rate(),
            "Dashboard loaded"
        );
    }
    drop(summary);

    if let Ok(stats) = portal.cache_stats().await {
        info!(?stats, "Cache statistics");
    }

    portal.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
