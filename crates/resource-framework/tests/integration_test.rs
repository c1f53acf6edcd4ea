use std::sync::Arc;
use std::time::Duration;

use resource_framework::error::NETWORK_MESSAGE;
use resource_framework::mock::{MockTransport, RecordingNotifier};
use resource_framework::{
    Api, ApiCaller, CacheActor, Endpoints, ListParams, Method, Payload, QueryClient, QueryStatus, Resource,
    ResourceClient, ResourceError, ResourceId, ResourceQueries, SessionCredential, Status, TransportError, Variant,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Sender {
    #[serde(default)]
    id: Option<ResourceId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Serialize)]
struct SenderInput {
    name: String,
}

impl Payload for SenderInput {
    fn validate(&self) -> Result<(), ResourceError> {
        resource_framework::resource::require_text("Name", &self.name)
    }
}

impl Resource for Sender {
    const FAMILY: &'static str = "senders";
    const LABEL: &'static str = "sender";
    const PLURAL_KEY: Option<&'static str> = Some("senders");
    const ENDPOINTS: Endpoints = Endpoints {
        api: Api::Sms,
        read_method: Method::Post,
        list: "/senders/list",
        get: "/senders/get",
        create: "/senders/create",
        update: "/senders/update",
        delete: "/senders/delete",
        change_status: "/senders/change-status",
        page_size_key: "limit",
    };

    type Create = SenderInput;
    type Update = SenderInput;

    fn id(&self) -> Option<ResourceId> {
        self.id.clone()
    }

    fn status(&self) -> Status {
        self.status
    }
}

struct Harness {
    transport: MockTransport,
    notifier: RecordingNotifier,
    senders: ResourceQueries<Sender>,
}

fn harness(transport: MockTransport, credentials: SessionCredential) -> Harness {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let notifier = RecordingNotifier::new();
    let caller = ApiCaller::new(Arc::new(transport.clone()), Arc::new(credentials));
    let queries = QueryClient::new(cache, Arc::new(notifier.clone()));
    Harness {
        transport,
        notifier,
        senders: ResourceQueries::new(ResourceClient::new(caller), queries),
    }
}

fn signed_in(transport: MockTransport) -> Harness {
    harness(transport, SessionCredential::with_key("test-key"))
}

#[tokio::test]
async fn test_refetch_twice_issues_one_call() {
    let transport = MockTransport::new().with_latency(Duration::from_millis(30));
    transport
        .expect_post("/senders/list")
        .return_ok(json!({ "data": [{ "id": 1, "name": "ACME", "status": 1 }] }));
    let h = signed_in(transport);

    let query = h.senders.list(ListParams::default(), true);
    let (a, b) = tokio::join!(query.refetch(), query.refetch());

    assert_eq!(h.transport.calls("/senders/list"), 1);
    assert_eq!(a.data, b.data);
    assert_eq!(a.data.map(|d| d.len()), Some(1));
    h.transport.verify();
}

#[tokio::test]
async fn test_simultaneous_consumers_share_one_call() {
    let transport = MockTransport::new().with_latency(Duration::from_millis(30));
    transport
        .expect_post("/senders/list")
        .return_ok(json!({ "message": [{ "id": 1, "name": "ACME", "status": "1" }] }));
    let h = signed_in(transport);

    let first = h.senders.list(ListParams::page(1, 20), true);
    let second = h.senders.list(ListParams::page(1, 20), true);
    assert_eq!(first.key(), second.key());

    let (a, b) = tokio::join!(first.fetch(), second.fetch());
    assert!(a.is_success() && b.is_success());
    assert_eq!(h.transport.total_calls(), 1);
}

#[tokio::test]
async fn test_different_params_are_different_entries() {
    let transport = MockTransport::new();
    transport.expect_post("/senders/list").always_ok(json!({ "data": [] }));
    let h = signed_in(transport);

    h.senders.list(ListParams::page(1, 10), true).fetch().await;
    h.senders.list(ListParams::page(2, 10), true).fetch().await;

    assert_eq!(h.transport.calls("/senders/list"), 2);
    let sent = h.transport.last_request("/senders/list").unwrap();
    assert_eq!(sent.data, json!({ "page": 2, "limit": 10 }));
}

#[tokio::test]
async fn test_falsy_id_never_reaches_transport() {
    let h = signed_in(MockTransport::new());

    for id in [None, Some(ResourceId::from(0i64)), Some(ResourceId::from(""))] {
        let query = h.senders.detail(id);
        let state = query.fetch().await;
        assert_eq!(state.status, QueryStatus::Disabled);
    }

    let err = h.senders.client().get_by_id(Some(&ResourceId::from(0i64))).await.unwrap_err();
    assert!(matches!(err, ResourceError::Validation(_)));
    assert_eq!(h.transport.total_calls(), 0);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_missing_credential_blocks_every_call() {
    let h = harness(MockTransport::new(), SessionCredential::new());

    let list = h.senders.list(ListParams::default(), true);
    assert!(list.fetch().await.is_disabled());

    let err = h
        .senders
        .client()
        .create(&SenderInput { name: "ACME".into() })
        .await
        .unwrap_err();
    assert_eq!(err, ResourceError::MissingCredential);
    assert_eq!(h.transport.total_calls(), 0);
}

#[tokio::test]
async fn test_detail_is_disabled_while_signed_out() {
    let h = harness(MockTransport::new(), SessionCredential::new());

    let query = h.senders.detail(Some(ResourceId::from(5i64)));
    assert!(!query.is_enabled());
    let state = query.fetch().await;

    assert_eq!(state.status, QueryStatus::Disabled);
    assert_eq!(state.data, None);
    assert_eq!(h.transport.total_calls(), 0);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_sign_in_enables_queries() {
    let transport = MockTransport::new();
    transport.expect_post("/senders/list").return_ok(json!({ "data": [] }));
    let credentials = Arc::new(SessionCredential::new());

    let (actor, cache) = CacheActor::new(8);
    tokio::spawn(actor.run());
    let caller = ApiCaller::new(Arc::new(transport.clone()), credentials.clone());
    let senders: ResourceQueries<Sender> = ResourceQueries::new(
        ResourceClient::new(caller),
        QueryClient::new(cache, Arc::new(RecordingNotifier::new())),
    );

    assert!(!senders.list(ListParams::default(), true).is_enabled());
    credentials.sign_in("fresh-key").unwrap();

    let state = senders.list(ListParams::default(), true).fetch().await;
    assert!(state.is_empty());
    assert_eq!(transport.last_request("/senders/list").unwrap().credential.as_deref(), Some("fresh-key"));
}

#[tokio::test]
async fn test_error_taxonomy() {
    let transport = MockTransport::new();
    transport.expect_post("/senders/create").return_err(TransportError::Http {
        status: 422,
        body: json!({ "message": "Name already taken" }),
    });
    transport
        .expect_post("/senders/create")
        .return_err(TransportError::NoResponse("connection refused".into()));
    transport.expect_post("/senders/create").return_ok(json!(null));
    transport
        .expect_post("/senders/create")
        .return_err(TransportError::Other("invalid json".into()));
    let h = signed_in(transport);
    let client = h.senders.client();
    let input = || SenderInput { name: "ACME".into() };

    assert_eq!(
        client.create(&input()).await.unwrap_err(),
        ResourceError::Api {
            status: 422,
            message: "Name already taken".into()
        }
    );
    let network = client.create(&input()).await.unwrap_err();
    assert_eq!(network, ResourceError::Network);
    assert_eq!(network.user_message(), NETWORK_MESSAGE);
    assert!(matches!(
        client.create(&input()).await.unwrap_err(),
        ResourceError::EmptyResponse { .. }
    ));
    assert_eq!(
        client.create(&input()).await.unwrap_err().user_message(),
        "Unexpected error while creating sender"
    );
    h.transport.verify();
}

#[tokio::test]
async fn test_failed_list_notifies_and_keeps_serving_fresh_calls() {
    let transport = MockTransport::new();
    transport.expect_post("/senders/list").return_err(TransportError::Http {
        status: 500,
        body: json!({ "error": "database unavailable" }),
    });
    transport
        .expect_post("/senders/list")
        .return_ok(json!({ "data": { "data": [{ "id": 2, "name": "Beta" }] } }));
    let h = signed_in(transport);

    let query = h.senders.list(ListParams::default(), true);
    let failed = query.fetch().await;
    assert!(failed.is_error());
    assert_eq!(h.notifier.count(Variant::Error), 1);
    assert_eq!(h.notifier.notifications()[0].title, "Could not load the sender list");
    assert_eq!(h.notifier.notifications()[0].message, "database unavailable");

    let recovered = query.fetch().await;
    assert!(recovered.is_success());
    assert_eq!(recovered.data.unwrap()[0].name, "Beta");
    assert_eq!(h.transport.calls("/senders/list"), 2);
}

#[tokio::test]
async fn test_toggle_sends_the_opposite_numeric_status() {
    let transport = MockTransport::new();
    transport.expect_post("/senders/change-status").return_ok(json!({ "message": "Status changed" }));
    let h = signed_in(transport);

    let active = Sender {
        id: Some(ResourceId::from(9i64)),
        name: "ACME".into(),
        status: Status::Active,
    };
    let toggle = h.senders.toggle_status();
    toggle.mutate_async(active).await.unwrap();

    let sent = h.transport.last_request("/senders/change-status").unwrap();
    assert_eq!(sent.data, json!({ "id": 9, "status": 0 }));
    assert_eq!(h.notifier.notifications()[0].message, "Status changed");
}
