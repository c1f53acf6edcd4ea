use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portal_sample::lifecycle::Portal;
use portal_sample::model::{
    ConnectorCreate, ConnectorUpdate, DateRange, ModulePermission, PermissionAssignment,
};
use resource_framework::error::NETWORK_MESSAGE;
use resource_framework::mock::{MockTransport, RecordingNotifier};
use resource_framework::transport::{TransportRequest, TransportResponse};
use resource_framework::{
    Api, ListParams, Method, ResourceError, ResourceId, SessionCredential, Transport, TransportError, Variant,
};
use serde_json::json;

fn portal_with(transport: Arc<dyn Transport>) -> (Portal, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let portal = Portal::with_parts(
        transport,
        Arc::new(SessionCredential::with_key("portal-key")),
        Arc::new(notifier.clone()),
        32,
    );
    (portal, notifier)
}

fn portal(transport: &MockTransport) -> (Portal, RecordingNotifier) {
    portal_with(Arc::new(transport.clone()))
}

/// Every request fails before a response arrives.
struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn request(&self, _request: TransportRequest) -> Result<TransportResponse, TransportError> {
        Err(TransportError::NoResponse("network unreachable".into()))
    }
}

#[tokio::test]
async fn test_list_from_message_envelope() {
    let transport = MockTransport::new();
    transport
        .expect_post("/connectors/list")
        .return_ok(json!({ "message": [{ "id": 1, "name": "Test Connector", "status": 1 }] }));
    let (portal, _) = portal(&transport);

    let state = portal.connectors_query(ListParams::default(), true).fetch().await;

    let connectors = state.data.expect("list loaded");
    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0].id, Some(ResourceId::Number(1)));
    assert!(connectors[0].status.is_active());
    transport.verify();
}

#[tokio::test]
async fn test_empty_list_is_reported_as_no_records() {
    let transport = MockTransport::new();
    transport.expect_post("/connectors/list").return_ok(json!({ "data": [] }));
    let (portal, _) = portal(&transport);

    let query = portal.connectors_query(ListParams::default(), true);
    let state = query.fetch().await;

    assert!(state.is_empty());
    assert!(!state.is_loading());
    assert_eq!(state.data, Some(vec![]));
}

#[tokio::test]
async fn test_create_invalidates_the_family() {
    let transport = MockTransport::new();
    transport.expect_post("/connectors/list").always_ok(json!({ "data": [] }));
    transport
        .expect_post("/connectors/create")
        .return_ok(json!({ "data": { "id": 7, "name": "Route A" } }));
    let (portal, notifier) = portal(&transport);

    let list = portal.connectors_query(ListParams::default(), true);
    list.fetch().await;
    list.fetch().await;
    assert_eq!(transport.calls("/connectors/list"), 1);

    portal
        .create_connector()
        .mutate_async(ConnectorCreate::new("Route A", 310, 260))
        .await
        .unwrap();

    list.fetch().await;
    assert_eq!(transport.calls("/connectors/list"), 2);

    let notes = notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].variant, Variant::Success);
    assert_eq!(notes[0].message, "Connector created successfully");
}

#[tokio::test]
async fn test_failed_create_notifies_once_and_keeps_cache() {
    let transport = MockTransport::new();
    transport.expect_post("/connectors/list").always_ok(json!({ "data": [] }));
    transport.expect_post("/connectors/create").return_err(TransportError::Http {
        status: 500,
        body: json!({ "message": "Internal server error" }),
    });
    let (portal, notifier) = portal(&transport);

    let list = portal.connectors_query(ListParams::default(), true);
    list.fetch().await;

    let err = portal
        .create_connector()
        .mutate_async(ConnectorCreate::new("Route A", 310, 260))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));

    assert_eq!(notifier.count(Variant::Error), 1);
    assert_eq!(notifier.notifications()[0].message, "Internal server error");

    list.fetch().await;
    assert_eq!(transport.calls("/connectors/list"), 1);
    assert_eq!(portal.cache_stats().await.unwrap().invalidated, 0);
}

#[tokio::test]
async fn test_simultaneous_lists_share_one_request() {
    let transport = MockTransport::new().with_latency(Duration::from_millis(40));
    transport.expect_post("/connectors/list").return_ok(json!({ "data": [] }));
    let (portal, _) = portal(&transport);

    let sidebar = portal.connectors_query(ListParams::default(), true);
    let table = portal.connectors_query(ListParams::default(), true);
    let (a, b) = tokio::join!(sidebar.fetch(), table.fetch());

    assert!(a.is_success() && b.is_success());
    assert_eq!(transport.total_calls(), 1);
    assert_eq!(portal.cache_stats().await.unwrap().deduplicated, 1);
}

#[tokio::test]
async fn test_invalid_mcc_and_mnc_never_reach_transport() {
    let transport = MockTransport::new();
    let (portal, notifier) = portal(&transport);
    let create = portal.create_connector();

    let err = create.mutate_async(ConnectorCreate::new("Route A", 0, 1)).await.unwrap_err();
    assert_eq!(err, ResourceError::validation("MCC must be a positive number"));

    let err = create.mutate_async(ConnectorCreate::new("Route A", 310, -1)).await.unwrap_err();
    assert_eq!(err, ResourceError::validation("MNC must be zero or greater"));

    assert_eq!(transport.total_calls(), 0);
    assert_eq!(notifier.count(Variant::Error), 2);
}

#[tokio::test]
async fn test_double_submit_sends_one_request() {
    let transport = MockTransport::new().with_latency(Duration::from_millis(40));
    transport
        .expect_post("/connectors/create")
        .return_ok(json!({ "message": "Connector saved" }));
    let (portal, notifier) = portal(&transport);

    let create = portal.create_connector();
    assert!(create.mutate(ConnectorCreate::new("Route A", 310, 0)));
    assert!(!create.mutate(ConnectorCreate::new("Route A", 310, 0)));

    while create.is_pending() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(transport.calls("/connectors/create"), 1);
    assert_eq!(notifier.notifications()[0].message, "Connector saved");
}

#[tokio::test]
async fn test_update_while_offline_reports_network_error() {
    let (portal, notifier) = portal_with(Arc::new(OfflineTransport));

    let update = ConnectorUpdate {
        name: Some("Renamed".into()),
        ..Default::default()
    };
    let err = portal
        .update_connector()
        .mutate_async((ResourceId::from(4i64), update))
        .await
        .unwrap_err();

    assert_eq!(err, ResourceError::Network);
    let notes = notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Error");
    assert_eq!(notes[0].message, NETWORK_MESSAGE);
}

#[tokio::test]
async fn test_toggle_reads_string_status_and_sends_number() {
    let transport = MockTransport::new();
    transport
        .expect_post("/connectors/get")
        .return_ok(json!({ "data": { "connector_id": 12, "name": "Route C", "status": "ACTIVE" } }));
    transport.expect_post("/connectors/change-status").return_ok(json!({ "success": true }));
    let (portal, notifier) = portal(&transport);

    let detail = portal.connector_query(Some(ResourceId::from(12i64))).fetch().await;
    let connector = detail.data.flatten().expect("connector loaded");

    portal.toggle_connector_status().mutate_async(connector).await.unwrap();

    let sent = transport.last_request("/connectors/change-status").unwrap();
    assert_eq!(sent.data, json!({ "id": 12, "status": 0 }));
    assert_eq!(notifier.notifications()[0].message, "Connector status changed successfully");
}

#[tokio::test]
async fn test_document_types_use_billing_get_and_per_page() {
    let transport = MockTransport::new();
    transport
        .expect_get("/document-types")
        .return_ok(json!({ "types": [{ "type_id": 3, "name": "Invoice", "status": "1" }] }));
    let (portal, _) = portal(&transport);

    let state = portal
        .document_types_query(ListParams::page(1, 25), true)
        .fetch()
        .await;

    assert_eq!(state.data.map(|d| d.len()), Some(1));
    let sent = transport.last_request("/document-types").unwrap();
    assert_eq!(sent.api, Api::Billing);
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.data, json!({ "page": 1, "per_page": 25 }));
}

#[tokio::test]
async fn test_assigning_permissions_refreshes_role_modules() {
    let transport = MockTransport::new();
    transport.expect_post("/roles/permissions").always_ok(json!({
        "modules": [{ "module_id": 1, "name": "Users", "actions": [{ "id": 4, "name": "view" }] }]
    }));
    transport.expect_post("/roles/assign-permissions").return_ok(json!({ "success": true }));
    let (portal, notifier) = portal(&transport);

    let modules = portal.role_modules_query(Some(ResourceId::from(2i64)));
    let state = modules.fetch().await;
    let rows = state.data.expect("modules loaded");
    assert_eq!(rows[0].module_name.as_deref(), Some("Users"));
    let read = transport.last_request("/roles/permissions").unwrap();
    assert_eq!(read.data, json!({ "role_id": 2 }));
    assert_eq!((read.api, read.method), (Api::Sms, Method::Post));

    let assignment = PermissionAssignment {
        role_id: ResourceId::from(2i64),
        modules: vec![ModulePermission {
            module_id: ResourceId::from(1i64),
            action_ids: vec![ResourceId::from(4i64)],
        }],
    };
    portal.assign_role_permissions().mutate_async(assignment).await.unwrap();
    assert_eq!(notifier.notifications()[0].message, "Role permissions saved successfully");
    let write = transport.last_request("/roles/assign-permissions").unwrap();
    assert_eq!((write.api, write.method), (Api::Sms, Method::Post));

    modules.fetch().await;
    assert_eq!(transport.calls("/roles/permissions"), 2);
}

#[tokio::test]
async fn test_role_modules_query_needs_a_role() {
    let transport = MockTransport::new();
    let (portal, _) = portal(&transport);

    assert!(portal.role_modules_query(None).fetch().await.is_disabled());
    assert!(portal
        .role_modules_query(Some(ResourceId::from(0i64)))
        .fetch()
        .await
        .is_disabled());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_role_modules_query_needs_a_credential() {
    let transport = MockTransport::new();
    let portal = Portal::with_parts(
        Arc::new(transport.clone()),
        Arc::new(SessionCredential::new()),
        Arc::new(RecordingNotifier::new()),
        8,
    );

    let state = portal.role_modules_query(Some(ResourceId::from(2i64))).fetch().await;
    assert!(state.is_disabled());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_dashboard_summary() {
    let transport = MockTransport::new();
    transport.expect_get("/dashboard/summary").return_ok(json!({
        "data": { "total_messages": 200, "delivered": "150", "failed": 50, "revenue": "12.50" }
    }));
    let (portal, notifier) = portal(&transport);

    let state = portal
        .dashboard_summary_query(DateRange::new("2026-01-01", "2026-01-31"))
        .fetch()
        .await;

    let summary = state.data.expect("summary loaded");
    assert_eq!(summary.total_messages, 200);
    assert_eq!(summary.delivery_rate(), 0.75);
    assert_eq!(summary.revenue, 12.5);

    let sent = transport.last_request("/dashboard/summary").unwrap();
    assert_eq!(sent.api, Api::Billing);
    assert_eq!(sent.data, json!({ "from": "2026-01-01", "to": "2026-01-31" }));

    let backwards = portal
        .dashboard_traffic_query(DateRange::new("2026-02-01", "2026-01-01"))
        .fetch()
        .await;
    assert!(backwards.is_error());
    assert_eq!(transport.calls("/dashboard/traffic"), 0);
    assert_eq!(notifier.notifications()[0].title, "Could not load the dashboard traffic");
}

#[tokio::test]
async fn test_signed_out_portal_runs_nothing() {
    let transport = MockTransport::new();
    let portal = Portal::with_parts(
        Arc::new(transport.clone()),
        Arc::new(SessionCredential::new()),
        Arc::new(RecordingNotifier::new()),
        8,
    );

    assert!(!portal.is_signed_in());
    assert!(portal.roles_query(ListParams::default(), true).fetch().await.is_disabled());
    assert!(portal
        .dashboard_summary_query(DateRange::new("2026-01-01", "2026-01-31"))
        .fetch()
        .await
        .is_disabled());

    portal.sign_in("late-key").unwrap();
    assert!(portal.is_signed_in());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_shutdown_after_queries_are_dropped() {
    let transport = MockTransport::new();
    transport.expect_post("/modules/list").return_ok(json!({ "data": [] }));
    let (portal, _) = portal(&transport);

    let modules = portal.modules_query(ListParams::default(), true);
    modules.fetch().await;
    drop(modules);

    portal.shutdown().await.expect("portal shuts down");
}
