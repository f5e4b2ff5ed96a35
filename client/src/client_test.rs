use std::sync::atomic::{AtomicUsize, Ordering};

use facilmap_protocol::types::{Point, Writable};
use serde_json::json;
use tokio::time::{Duration, timeout};

use super::*;
use crate::transport::test_helpers::MockTransport;
use crate::transport::{EmitError, ListenerScope};

fn config() -> ClientConfig {
    ClientConfig::new("https://facilmap.example")
}

fn start(config: &ClientConfig) -> (Client, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let client = Client::with_transport(config, transport.clone());
    (client, transport)
}

/// Wait until `cond` holds, letting spawned tasks run in between.
async fn until(cond: impl Fn() -> bool) {
    timeout(Duration::from_millis(500), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition was not reached in time");
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn record(client: &Client, names: &[EventName]) -> Arc<Mutex<Vec<EventName>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in names {
        let sink = Arc::clone(&log);
        client.on(*name, move |event| sink.lock().push(event.name()));
    }
    log
}

fn count(client: &Client, name: EventName) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    client.on(name, move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

fn route_json(mode: &str) -> Value {
    json!({
        "routePoints": [{"lat": 1, "lon": 1}, {"lat": 2, "lon": 2}],
        "mode": mode,
        "distance": 12.5,
        "top": 2, "bottom": 1, "left": 1, "right": 2,
        "trackPoints": [{"lat": 1, "lon": 1, "idx": 0, "zoom": 1}, {"lat": 2, "lon": 2, "idx": 1, "zoom": 1}]
    })
}

fn route_create(mode: &str, route_id: Option<&str>) -> RouteCreate {
    RouteCreate {
        route_points: vec![Point { lat: 1.0, lon: 1.0 }, Point { lat: 2.0, lon: 2.0 }],
        mode: mode.to_owned(),
        route_id: route_id.map(str::to_owned),
    }
}

fn bbox() -> BboxWithZoom {
    BboxWithZoom { bbox: Bbox { top: 2.0, bottom: 1.0, left: 1.0, right: 2.0 }, zoom: 7, except: None }
}

// =============================================================================
// lifecycle
// =============================================================================

#[tokio::test]
async fn load_start_fires_once_before_connect_and_load_end_on_connect() {
    let (client, transport) = start(&config());
    let log = record(&client, &[EventName::LoadStart, EventName::LoadEnd, EventName::Connect]);
    assert!(client.session().disconnected);
    assert_eq!(client.session().loading, 0);

    settle().await;
    assert_eq!(*log.lock(), vec![EventName::LoadStart]);
    assert_eq!(client.session().loading, 1);

    transport.connect();
    until(|| !client.session().disconnected).await;
    assert_eq!(client.session().loading, 0);

    transport.disconnect("transport close");
    transport.connect();
    settle().await;
    let log = log.lock();
    assert_eq!(log.iter().filter(|name| **name == EventName::LoadStart).count(), 1);
    assert_eq!(log.iter().filter(|name| **name == EventName::LoadEnd).count(), 1);
    assert_eq!(log.iter().filter(|name| **name == EventName::Connect).count(), 2);
}

#[tokio::test]
async fn store_events_attach_once_on_their_scope() {
    let (client, transport) = start(&config());
    let attached = transport.attached();
    assert!(attached.contains(&(ListenerScope::Namespace, "mapData")));
    assert!(attached.contains(&(ListenerScope::Namespace, "connect")));
    assert!(attached.contains(&(ListenerScope::Namespace, "disconnect")));
    assert!(attached.iter().all(|(scope, _)| *scope == ListenerScope::Namespace));

    client.on(EventName::Marker, |_| {});
    client.on(EventName::Marker, |_| {});
    client.on(EventName::ReconnectAttempt, |_| {});
    client.on(EventName::ReconnectAttempt, |_| {});
    client.on(EventName::LoadStart, |_| {});

    let attached = transport.attached();
    assert_eq!(attached.iter().filter(|(_, name)| *name == "marker").count(), 1);
    assert_eq!(
        attached.iter().filter(|entry| **entry == (ListenerScope::Manager, "reconnect_attempt")).count(),
        1
    );
    assert!(!attached.iter().any(|(_, name)| *name == "loadStart"));
}

#[tokio::test]
async fn legacy_sessions_attach_legacy_names() {
    let (_client, transport) = start(&config().with_protocol(ProtocolVersion::V2));
    let attached = transport.attached();
    assert!(attached.contains(&(ListenerScope::Namespace, "padData")));
    assert!(!attached.contains(&(ListenerScope::Namespace, "mapData")));
}

#[tokio::test]
async fn manager_events_reach_listeners() {
    let (client, transport) = start(&config());
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&attempts);
    client.on(EventName::ReconnectAttempt, move |event| {
        if let ClientEvent::ReconnectAttempt(attempt) = event {
            sink.lock().push(*attempt);
        }
    });
    transport.push(TransportEvent::Manager(ManagerEvent::ReconnectAttempt(1)));
    transport.push(TransportEvent::Manager(ManagerEvent::ReconnectAttempt(2)));
    until(|| attempts.lock().len() == 2).await;
    assert_eq!(*attempts.lock(), vec![1, 2]);
}

#[tokio::test]
async fn disconnect_closes_transport_and_fails_later_requests() {
    let (client, transport) = start(&config());
    transport.connect();
    until(|| !client.session().disconnected).await;

    let reasons = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reasons);
    client.on(EventName::Disconnect, move |event| {
        if let ClientEvent::Disconnect(reason) = event {
            sink.lock().push(reason.clone());
        }
    });

    client.disconnect();
    assert!(transport.is_closed());
    assert!(client.session().disconnected);
    assert_eq!(*reasons.lock(), vec![CLIENT_DISCONNECT.to_owned()]);

    let err = client.geoip().await.expect_err("closed transport");
    assert!(matches!(err, ClientError::Transport(_)));
}

// =============================================================================
// requests
// =============================================================================

#[tokio::test]
async fn set_pad_id_attaches_and_rejects_second_call() {
    let (client, transport) = start(&config());
    transport.respond_with(|name, _| {
        (name == "setMapId").then(|| Ok(json!({"mapData": [{"id": "abc", "name": "Pad", "writable": 0}]})))
    });

    client.set_pad_id("abc").await.expect("attach");
    let session = client.session();
    assert_eq!(session.pad_id.as_deref(), Some("abc"));
    assert_eq!(session.readonly, Some(true));
    assert_eq!(session.writable, Some(Writable::Read));
    assert_eq!(client.pad_data().map(|pad| pad.name), Some("Pad".to_owned()));
    assert_eq!(transport.requests(), vec![("setMapId".to_owned(), json!("abc"))]);

    let err = client.set_pad_id("other").await.expect_err("second attach");
    assert_eq!(err, ClientError::PadIdAlreadySet);
    assert_eq!(err.to_string(), "Pad ID already set.");
    assert_eq!(transport.request_names(), vec!["setMapId"]);
}

#[tokio::test]
async fn configured_pad_id_counts_as_set() {
    let (client, transport) = start(&config().with_pad_id("abc"));
    assert_eq!(client.set_pad_id("abc").await, Err(ClientError::PadIdAlreadySet));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn failed_attach_stores_server_error_and_balances_loading() {
    let (client, transport) = start(&config().with_protocol(ProtocolVersion::V2));
    settle().await;
    let base = client.session().loading;
    let server_errors = count(&client, EventName::ServerError);
    let rejects = count(&client, EventName::EmitReject);
    transport.respond_with(|_, _| {
        Some(Err(EmitError::Remote { name: Some("PadNotFoundError".to_owned()), message: "Pad abc not found".to_owned() }))
    });

    let err = client.set_pad_id("abc").await.expect_err("unknown pad");
    assert_eq!(
        err,
        ClientError::Request { name: Some("MapNotFoundError".to_owned()), message: "Pad abc not found".to_owned() }
    );
    assert_eq!(err.server_error_name(), Some("MapNotFoundError"));
    assert_eq!(client.session().server_error, Some(err));
    assert_eq!(client.session().loading, base);
    assert_eq!(server_errors.load(Ordering::SeqCst), 1);
    assert_eq!(rejects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn requests_fire_emit_events_around_the_round_trip() {
    let (client, transport) = start(&config());
    settle().await;
    let log = record(
        &client,
        &[EventName::LoadStart, EventName::Emit, EventName::EmitResolve, EventName::LoadEnd],
    );
    transport.respond_with(|_, _| Some(Ok(Value::Null)));

    assert_eq!(client.geoip().await, Ok(None));
    assert_eq!(
        *log.lock(),
        vec![EventName::LoadStart, EventName::Emit, EventName::EmitResolve, EventName::LoadEnd]
    );
}

#[tokio::test]
async fn dropped_request_still_ends_loading() {
    let (client, transport) = start(&config());
    settle().await;
    let base = client.session().loading;

    let task = tokio::spawn({
        let client = client.clone();
        async move { client.delete_pad().await }
    });
    let pending = transport.next_request().await;
    assert_eq!(pending.name, "deleteMap");
    assert_eq!(client.session().loading, base + 1);

    task.abort();
    assert!(task.await.is_err());
    assert_eq!(client.session().loading, base);
}

#[tokio::test]
async fn legacy_sessions_use_legacy_wire_names() {
    let (client, transport) = start(&config().with_protocol(ProtocolVersion::V2));
    transport.respond_with(|name, _| {
        (name == "getPad").then(|| Ok(json!({"id": "abc", "name": "Pad", "description": "d"})))
    });

    let pad = client.get_pad(GetPadQuery { map_id: "abc".to_owned() }).await.expect("get pad");
    assert_eq!(pad.map(|pad| pad.name), Some("Pad".to_owned()));
    assert_eq!(transport.requests(), vec![("getPad".to_owned(), json!({"padId": "abc"}))]);
}

#[tokio::test]
async fn create_pad_grants_admin_access() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, _| Some(Ok(json!({"mapData": [{"id": "r", "writeId": "w", "adminId": "a"}]}))));

    let pad = PadCreate { id: "r".to_owned(), write_id: "w".to_owned(), admin_id: "a".to_owned(), ..PadCreate::default() };
    client.create_pad(pad).await.expect("create pad");
    let session = client.session();
    assert_eq!(session.writable, Some(Writable::Admin));
    assert_eq!(session.readonly, Some(false));
    assert_eq!(session.pad_id.as_deref(), Some("a"));
}

#[tokio::test]
async fn add_marker_stores_the_result() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, data| {
        Some(Ok(json!({"id": 9, "lat": data["lat"], "lon": data["lon"], "typeId": 1, "data": {"Floor": 3}})))
    });

    let marker = client
        .add_marker(MarkerCreate { lat: 1.5, lon: 2.5, type_id: 1, ..MarkerCreate::default() })
        .await
        .expect("add marker");
    assert_eq!(marker.id, 9);
    assert_eq!(client.read(|store| store.marker(9).cloned()), Some(marker.clone()));
    assert_eq!(marker.data.get("Floor"), Some("3"));
}

#[tokio::test]
async fn history_flag_follows_listen_and_stop() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, _| {
        Some(Ok(json!({"history": [{"id": 1, "type": "Marker", "action": "create"}]})))
    });

    client.listen_to_history().await.expect("listen");
    assert!(client.session().listening_to_history);
    assert_eq!(client.snapshot().history.len(), 1);

    transport.respond_with(|_, _| Some(Ok(Value::Null)));
    client.stop_listening_to_history().await.expect("stop");
    assert!(!client.session().listening_to_history);
}

#[tokio::test]
async fn revert_history_entry_replaces_history() {
    let (client, transport) = start(&config());
    transport.respond_with(|name, _| match name {
        "listenToHistory" => Some(Ok(json!({"history": [{"id": 1, "type": "Marker", "action": "create"}]}))),
        _ => Some(Ok(json!({"history": [{"id": 2, "type": "Marker", "action": "delete"}]}))),
    });
    client.listen_to_history().await.expect("listen");
    client.revert_history_entry(ObjectWithId { id: 1 }).await.expect("revert");

    let ids: Vec<_> = client.snapshot().history.keys().copied().collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn envelope_entries_apply_in_dependency_order() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, _| {
        Some(Ok(json!({
            "linePoints": [{"id": 5, "trackPoints": [{"lat": 1, "lon": 1, "idx": 0}, {"lat": 2, "lon": 2, "idx": 2}]}],
            "line": [{"id": 5, "typeId": 1}],
            "marker": [{"id": 1, "lat": 1, "lon": 1, "typeId": 1}, {"id": 2, "lat": 2, "lon": 2, "typeId": 1}],
            "bogus": [1]
        })))
    });

    client.update_bbox(bbox()).await.expect("update bbox");
    assert_eq!(client.session().bbox, Some(bbox()));
    client.read(|store| {
        assert_eq!(store.data().markers.len(), 2);
        let line = store.line(5).expect("line");
        assert_eq!(line.track_points.len(), 3);
        assert_eq!(line.track_points.populated(), 2);
    });
}

// =============================================================================
// pushes
// =============================================================================

#[tokio::test]
async fn legacy_pushes_are_translated_before_the_store() {
    let (client, transport) = start(&config().with_protocol(ProtocolVersion::V2));
    transport.server_push("marker", json!({"id": 1, "lat": 1, "lon": 2, "typeId": 1, "symbol": "star", "data": {"n": 4}}));
    until(|| client.read(|store| store.marker(1).is_some())).await;

    let marker = client.read(|store| store.marker(1).cloned()).expect("marker");
    assert_eq!(marker.icon, "star");
    assert_eq!(marker.data.get("n"), Some("4"));
}

#[tokio::test]
async fn malformed_and_unknown_pushes_are_dropped() {
    let (client, transport) = start(&config());
    let markers = count(&client, EventName::Marker);
    transport.server_push("marker", json!({"lat": "nope"}));
    transport.server_push("padData", json!({"id": "abc"}));
    transport.server_push("marker", json!({"id": 2, "lat": 1, "lon": 1, "typeId": 1}));

    until(|| markers.load(Ordering::SeqCst) == 1).await;
    assert!(client.read(|store| store.marker(2).is_some()));
    assert!(client.pad_data().is_none());
}

#[tokio::test]
async fn store_changes_are_published() {
    let (client, transport) = start(&config());
    settle().await;
    let mut revisions = client.subscribe();
    let seen = *revisions.borrow_and_update();

    transport.server_push("view", json!({"id": 3, "name": "Home"}));
    timeout(Duration::from_millis(500), revisions.changed())
        .await
        .expect("revision change timed out")
        .expect("revision channel closed");
    assert!(*revisions.borrow() > seen);
    assert!(client.read(|store| store.view(3).is_some()));
}

// =============================================================================
// routes
// =============================================================================

#[tokio::test]
async fn newer_route_submission_wins() {
    let (client, transport) = start(&config());
    let route_events = count(&client, EventName::Route);

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.set_route(route_create("car", None)).await }
    });
    let first_request = transport.next_request().await;
    let second = tokio::spawn({
        let client = client.clone();
        async move { client.set_route(route_create("bicycle", None)).await }
    });
    let second_request = transport.next_request().await;

    second_request.respond(route_json("bicycle"));
    let stored = second.await.expect("join").expect("set route").expect("current route");
    assert_eq!(stored.info.mode, "bicycle");
    assert_eq!(stored.track_points.len(), 2);

    first_request.respond(route_json("car"));
    assert_eq!(first.await.expect("join"), Ok(None));
    assert_eq!(client.route(None).map(|route| route.info.mode), Some("bicycle".to_owned()));
    assert_eq!(route_events.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_route_reply_is_discarded() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, _| Some(Ok(Value::Null)));
    assert_eq!(client.set_route(route_create("car", Some("a"))).await, Ok(None));
    assert!(client.route(Some("a")).is_none());
}

#[tokio::test]
async fn line_to_route_fills_named_slot() {
    let (client, transport) = start(&config());
    transport.respond_with(|_, _| Some(Ok(route_json("car"))));
    let route = client
        .line_to_route(LineToRouteCreate { id: 5, route_id: Some("edit".to_owned()) })
        .await
        .expect("line to route")
        .expect("route");
    assert_eq!(route.route_id.as_deref(), Some("edit"));
    assert_eq!(client.route(Some("edit")), Some(route));
}

#[tokio::test]
async fn clear_route_fires_before_the_round_trip() {
    let (client, transport) = start(&config());
    transport.respond_with(|name, _| (name == "setRoute").then(|| Ok(route_json("car"))));
    client.set_route(route_create("car", None)).await.expect("set route");
    let clears = count(&client, EventName::ClearRoute);

    let task = tokio::spawn({
        let client = client.clone();
        async move { client.clear_route(RouteClear::default()).await }
    });
    let pending = transport.next_request().await;
    assert_eq!(pending.name, "clearRoute");
    assert_eq!(clears.load(Ordering::SeqCst), 1);
    assert!(client.route(None).is_none());

    pending.respond(Value::Null);
    assert_eq!(task.await.expect("join"), Ok(()));
}

#[tokio::test]
async fn clearing_unset_singleton_route_sends_nothing() {
    let (client, transport) = start(&config());
    let clears = count(&client, EventName::ClearRoute);
    client.clear_route(RouteClear::default()).await.expect("clear");
    assert!(transport.requests().is_empty());
    assert_eq!(clears.load(Ordering::SeqCst), 0);

    transport.respond_with(|_, _| Some(Ok(Value::Null)));
    client.clear_route(RouteClear { route_id: Some("x".to_owned()) }).await.expect("clear named");
    assert_eq!(transport.request_names(), vec!["clearRoute"]);
    assert_eq!(clears.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clear_discards_route_still_in_flight() {
    let (client, transport) = start(&config());
    let task = tokio::spawn({
        let client = client.clone();
        async move { client.set_route(route_create("car", None)).await }
    });
    let pending = transport.next_request().await;
    client.clear_route(RouteClear::default()).await.expect("clear");

    pending.respond(route_json("car"));
    assert_eq!(task.await.expect("join"), Ok(None));
    assert!(client.route(None).is_none());
}

#[tokio::test]
async fn cleared_route_slots_are_forgotten() {
    let (client, transport) = start(&config());
    transport.respond_with(|name, _| match name {
        "setRoute" => Some(Ok(route_json("car"))),
        _ => Some(Ok(Value::Null)),
    });
    for id in ["a", "b", "c"] {
        client.set_route(route_create("car", Some(id))).await.expect("set route");
        client.clear_route(RouteClear { route_id: Some(id.to_owned()) }).await.expect("clear route");
    }
    assert!(client.inner.route_generations.lock().is_empty());

    let route = client.set_route(route_create("foot", Some("a"))).await.expect("reuse slot");
    assert_eq!(route.map(|route| route.info.mode), Some("car".to_owned()));
    assert!(client.route(Some("a")).is_some());
}

// =============================================================================
// reconnect
// =============================================================================

#[tokio::test]
async fn reconnect_replays_subscriptions_in_order() {
    let (client, transport) = start(&config());
    transport.respond_with(|name, _| match name {
        "setRoute" => Some(Ok(route_json("car"))),
        _ => Some(Ok(json!({}))),
    });
    transport.connect();
    until(|| !client.session().disconnected).await;

    client.set_pad_id("abc").await.expect("attach");
    client.update_bbox(bbox()).await.expect("bbox");
    client.listen_to_history().await.expect("history");
    client.set_route(route_create("car", Some("b"))).await.expect("named route");
    client.set_route(route_create("car", None)).await.expect("route");
    let before = transport.requests().len();

    transport.disconnect("transport close");
    transport.connect();
    until(|| transport.requests().len() == before + 5).await;

    let replayed: Vec<_> = transport.requests().split_off(before);
    let names: Vec<_> = replayed.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["setMapId", "updateBbox", "listenToHistory", "setRoute", "setRoute"]);
    assert_eq!(replayed[0].1, json!("abc"));
    assert_eq!(replayed[3].1.get("routeId"), None);
    assert_eq!(replayed[4].1["routeId"], "b");
}

#[tokio::test]
async fn disconnect_event_clears_pad_objects() {
    let (client, transport) = start(&config());
    transport.connect();
    transport.server_push("marker", json!({"id": 1, "lat": 1, "lon": 1, "typeId": 1}));
    until(|| client.read(|store| store.marker(1).is_some())).await;

    transport.disconnect("ping timeout");
    until(|| client.session().disconnected).await;
    assert!(client.snapshot().markers.is_empty());
}
