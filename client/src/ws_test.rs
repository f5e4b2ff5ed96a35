use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::{Duration, timeout};

use super::*;

fn transport() -> WsTransport {
    WsTransport::new(&ClientConfig::new("http://127.0.0.1:1")).expect("transport")
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("transport event timed out")
        .expect("transport event channel closed")
}

#[test]
fn new_builds_versioned_socket_url() {
    let transport = WsTransport::new(&ClientConfig::new("https://facilmap.org/")).expect("transport");
    assert_eq!(transport.url(), "wss://facilmap.org/socket.io/v3");
    assert!(matches!(WsTransport::new(&ClientConfig::new("ftp://x")), Err(ConfigError::InvalidServer(_))));
}

#[test]
fn replies_resolve_their_waiting_request() {
    let transport = transport();
    let (events, _rx) = mpsc::unbounded_channel();
    let request = Frame::request("getMap", json!({"mapId": "abc"}));
    let (reply, mut waiting) = oneshot::channel();
    transport.shared.pending.lock().insert(request.id.clone(), reply);

    transport.shared.handle_frame(&encode_frame(&request.done(json!({"id": "abc"}))), &events);
    assert_eq!(waiting.try_recv().expect("reply"), Ok(json!({"id": "abc"})));
    assert!(transport.shared.pending.lock().is_empty());
}

#[test]
fn error_replies_carry_name_and_message() {
    let transport = transport();
    let (events, _rx) = mpsc::unbounded_channel();
    let request = Frame::request("getMap", Value::Null);
    let (reply, mut waiting) = oneshot::channel();
    transport.shared.pending.lock().insert(request.id.clone(), reply);

    let error = request.error(Some("MapNotFoundError"), "Map abc not found");
    transport.shared.handle_frame(&encode_frame(&error), &events);
    assert_eq!(
        waiting.try_recv().expect("reply"),
        Err(EmitError::Remote { name: Some("MapNotFoundError".to_owned()), message: "Map abc not found".to_owned() })
    );
}

#[test]
fn only_attached_pushes_are_forwarded() {
    let transport = transport();
    let (events, mut rx) = mpsc::unbounded_channel();
    let push = encode_frame(&Frame::event("marker", json!({"id": 1})));

    transport.shared.handle_frame(&push, &events);
    assert!(rx.try_recv().is_err());

    transport.attach(ListenerScope::Manager, "marker");
    transport.shared.handle_frame(&push, &events);
    assert!(rx.try_recv().is_err());

    transport.attach(ListenerScope::Namespace, "marker");
    transport.shared.handle_frame(&push, &events);
    assert_eq!(
        rx.try_recv().expect("push"),
        TransportEvent::Push { name: "marker".to_owned(), data: json!({"id": 1}) }
    );
}

#[test]
fn undecodable_and_orphan_frames_are_ignored() {
    let transport = transport();
    let (events, mut rx) = mpsc::unbounded_channel();
    transport.shared.handle_frame(&[0xff, 0xff, 0xff], &events);
    let orphan = Frame::request("getMap", Value::Null).done(Value::Null);
    transport.shared.handle_frame(&encode_frame(&orphan), &events);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn close_fails_waiting_and_later_requests() {
    let transport = Arc::new(transport());
    let task = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move { transport.emit("geoip", Value::Null).await }
    });
    timeout(Duration::from_millis(500), async {
        while transport.shared.pending.lock().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("request was not registered");

    transport.close();
    assert_eq!(task.await.expect("join"), Err(EmitError::Transport(CLOSED.to_owned())));
    assert_eq!(transport.emit("geoip", Value::Null).await, Err(EmitError::Transport(CLOSED.to_owned())));
}

#[tokio::test]
async fn connects_answers_requests_and_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake");
        while let Some(Ok(message)) = ws.next().await {
            let Message::Binary(bytes) = message else {
                continue;
            };
            let request = decode_frame(&bytes).expect("request frame");
            let reply = request.done(json!({"echo": request.data}));
            ws.send(Message::Binary(encode_frame(&reply).into())).await.expect("send reply");
            let line = Frame::event("line", json!({"id": 2}));
            ws.send(Message::Binary(encode_frame(&line).into())).await.expect("send line");
            let marker = Frame::event("marker", json!({"id": 1}));
            ws.send(Message::Binary(encode_frame(&marker).into())).await.expect("send marker");
            break;
        }
        let _ = ws.close(None).await;

        let (tcp, _) = listener.accept().await.expect("accept again");
        let _ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake again");
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}"))
        .with_reconnect(ReconnectPolicy { initial_ms: 10, max_ms: 20, max_attempts: None });
    let transport = WsTransport::new(&config).expect("transport");
    transport.attach(ListenerScope::Namespace, "marker");
    let mut rx = transport.open();
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connect);

    let reply = timeout(Duration::from_secs(2), transport.emit("getMap", json!({"mapId": "abc"})))
        .await
        .expect("reply timed out");
    assert_eq!(reply, Ok(json!({"echo": {"mapId": "abc"}})));

    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Push { name: "marker".to_owned(), data: json!({"id": 1}) }
    );
    assert!(matches!(next_event(&mut rx).await, TransportEvent::Disconnect(_)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::ReconnectAttempt(1)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::Reconnect(1)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connect);

    transport.close();
    server.abort();
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}"))
        .with_reconnect(ReconnectPolicy { initial_ms: 5, max_ms: 5, max_attempts: Some(1) });
    let transport = WsTransport::new(&config).expect("transport");
    let mut rx = transport.open();

    assert!(matches!(next_event(&mut rx).await, TransportEvent::ConnectError(_)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::ReconnectAttempt(1)));
    assert!(matches!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::ReconnectError(_))));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::ReconnectFailed));
}

#[tokio::test]
async fn giving_up_fails_waiting_and_later_requests() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}"))
        .with_reconnect(ReconnectPolicy { initial_ms: 50, max_ms: 50, max_attempts: Some(1) });
    let transport = Arc::new(WsTransport::new(&config).expect("transport"));
    let mut rx = transport.open();
    assert!(matches!(next_event(&mut rx).await, TransportEvent::ConnectError(_)));

    let waiting = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move { transport.emit("getMap", json!({"mapId": "abc"})).await }
    });
    loop {
        if next_event(&mut rx).await == TransportEvent::Manager(ManagerEvent::ReconnectFailed) {
            break;
        }
    }

    let result = timeout(Duration::from_secs(2), waiting)
        .await
        .expect("request still waiting after giving up")
        .expect("join");
    assert!(matches!(result, Err(EmitError::Transport(_))));
    assert!(transport.shared.pending.lock().is_empty());
    assert_eq!(transport.emit("geoip", Value::Null).await, Err(EmitError::Transport(CLOSED.to_owned())));
}

#[tokio::test]
async fn requests_during_a_drop_fail_or_wait_for_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake");
        // Drop the connection without answering the first request.
        while let Some(Ok(message)) = ws.next().await {
            if matches!(message, Message::Binary(_)) {
                break;
            }
        }
        let _ = ws.close(None).await;

        let (tcp, _) = listener.accept().await.expect("accept again");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake again");
        while let Some(Ok(message)) = ws.next().await {
            let Message::Binary(bytes) = message else {
                continue;
            };
            let request = decode_frame(&bytes).expect("request frame");
            let reply = request.done(json!({"echo": request.data}));
            ws.send(Message::Binary(encode_frame(&reply).into())).await.expect("send reply");
        }
    });

    let config = ClientConfig::new(format!("http://127.0.0.1:{port}"))
        .with_reconnect(ReconnectPolicy { initial_ms: 10, max_ms: 20, max_attempts: None });
    let transport = Arc::new(WsTransport::new(&config).expect("transport"));
    let mut rx = transport.open();
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connect);

    let dropped = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move { transport.emit("getMap", json!({"mapId": "dropped"})).await }
    });
    let dropped = timeout(Duration::from_secs(2), dropped).await.expect("dropped request timed out").expect("join");
    assert!(matches!(dropped, Err(EmitError::Transport(_))));
    assert!(matches!(next_event(&mut rx).await, TransportEvent::Disconnect(_)));

    let queued = timeout(Duration::from_secs(2), transport.emit("getMap", json!({"mapId": "queued"})))
        .await
        .expect("queued request timed out");
    assert_eq!(queued, Ok(json!({"echo": {"mapId": "queued"}})));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::ReconnectAttempt(1)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Manager(ManagerEvent::Reconnect(1)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Connect);

    transport.close();
    server.abort();
}

#[tokio::test]
async fn abandoned_requests_leave_the_pending_table() {
    let transport = transport();
    let abandoned = timeout(Duration::from_millis(20), transport.emit("getMap", json!({"mapId": "abc"}))).await;
    assert!(abandoned.is_err());
    assert!(transport.shared.pending.lock().is_empty());

    // The frame is still queued, but the connection loop skips it.
    let queued = transport.outbound_rx.lock().as_mut().expect("outbound queue").try_recv().expect("queued frame");
    assert_eq!(queued.name, "getMap");
    assert!(!transport.shared.is_pending(&queued.id));
}
