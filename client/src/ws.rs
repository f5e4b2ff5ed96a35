//! Websocket transport speaking binary protobuf frames.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`WsTransport`] connects to `{server}/socket.io/v{n}` and keeps the
//! connection alive: after a drop it reconnects with exponential backoff and
//! reports the attempts as connection-manager events.
//!
//! DESIGN
//! ======
//! - Every request is a [`Frame`] with a fresh id. The caller waits on a
//!   oneshot registered under that id; the reply frame's `parent_id` resolves
//!   it.
//! - Outbound frames go through a queue that is only drained while
//!   connected, so requests made while disconnected are sent after the next
//!   connect.
//! - When the connection drops, every request still waiting for a reply
//!   fails. Queued frames whose request already failed are skipped.
//! - Once reconnecting is given up the transport counts as closed: waiting
//!   and later requests fail right away.
//! - A request whose caller stops waiting is removed from the pending table,
//!   and its frame is not sent if it is still queued.
//! - Server pushes are only forwarded for event names a listener attached.
//! - The `/socket.io/v{n}` path only selects the protocol version. Frames on
//!   the socket are the binary [`Frame`] codec, not Engine.IO or Socket.IO
//!   packets.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use facilmap_protocol::{Frame, Status, decode_frame, encode_frame};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::error::ConfigError;
use crate::transport::{EmitError, ListenerScope, ManagerEvent, Transport, TransportEvent};

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type Reply = oneshot::Sender<Result<Value, EmitError>>;

const CLOSED: &str = "transport closed";
const GAVE_UP: &str = "reconnect failed";

pub struct WsTransport {
    url: String,
    policy: ReconnectPolicy,
    shared: Arc<Shared>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Frame>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    /// Namespace event names a listener attached.
    attached: Mutex<HashSet<&'static str>>,
    pending: Mutex<HashMap<String, Reply>>,
    outbound: mpsc::UnboundedSender<Frame>,
    closed: AtomicBool,
    shutdown: Notify,
}

impl WsTransport {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServer`] if the server URL has no usable
    /// scheme or host.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let url = config.socket_url()?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        Ok(Self {
            url,
            policy: config.reconnect,
            shared: Arc::new(Shared {
                attached: Mutex::new(HashSet::new()),
                pending: Mutex::new(HashMap::new()),
                outbound,
                closed: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            outbound_rx: Mutex::new(Some(outbound_rx)),
            task: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    fn attach(&self, scope: ListenerScope, name: &'static str) {
        // Lifecycle and manager events are always reported.
        if scope == ListenerScope::Namespace {
            self.shared.attached.lock().insert(name);
        }
    }

    fn open(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
        let (events, rx) = mpsc::unbounded_channel();
        let Some(outbound_rx) = self.outbound_rx.lock().take() else {
            tracing::warn!(url = %self.url, "ws: transport opened twice");
            return rx;
        };
        let task = tokio::spawn(run(Arc::clone(&self.shared), self.url.clone(), self.policy, events, outbound_rx));
        *self.task.lock() = Some(task);
        rx
    }

    async fn emit(&self, name: &str, data: Value) -> Result<Value, EmitError> {
        if self.shared.is_closed() {
            return Err(EmitError::Transport(CLOSED.to_owned()));
        }
        let frame = Frame::request(name, data);
        let (reply, rx) = oneshot::channel();
        self.shared.pending.lock().insert(frame.id.clone(), reply);
        let waiting = Waiting { shared: &self.shared, id: frame.id.clone() };
        // Closing drains the table after setting the flag; re-check so an entry
        // inserted after the drain does not wait forever.
        if self.shared.is_closed() || self.shared.outbound.send(frame).is_err() {
            return Err(EmitError::Transport(CLOSED.to_owned()));
        }
        let result = rx.await.unwrap_or_else(|_| Err(EmitError::Transport(CLOSED.to_owned())));
        drop(waiting);
        result
    }

    fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.shutdown.notify_one();
        self.shared.fail_pending(CLOSED);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

/// Removes a request from the pending table when its caller stops waiting.
struct Waiting<'a> {
    shared: &'a Shared,
    id: String,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.shared.pending.lock().remove(&self.id);
    }
}

// =============================================================================
// CONNECTION LOOP
// =============================================================================

async fn run(
    shared: Arc<Shared>,
    url: String,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
) {
    let mut attempt: u32 = 0;
    loop {
        if shared.is_closed() {
            break;
        }
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!(%url, "ws: connected");
                if attempt > 0 {
                    let _ = events.send(TransportEvent::Manager(ManagerEvent::Reconnect(attempt)));
                }
                attempt = 0;
                let _ = events.send(TransportEvent::Connect);

                let reason = serve(&shared, stream, &events, &mut outbound).await;
                shared.fail_pending(&reason);
                if shared.is_closed() {
                    break;
                }
                tracing::warn!(%url, %reason, "ws: disconnected");
                let _ = events.send(TransportEvent::Disconnect(reason));
            }
            Err(error) => {
                tracing::warn!(%url, %error, attempt, "ws: connect failed");
                let event = if attempt == 0 {
                    TransportEvent::ConnectError(error.to_string())
                } else {
                    TransportEvent::Manager(ManagerEvent::ReconnectError(error.to_string()))
                };
                let _ = events.send(event);
            }
        }

        attempt = attempt.saturating_add(1);
        if !policy.allows(attempt) {
            tracing::warn!(%url, attempts = attempt - 1, "ws: giving up reconnecting");
            shared.closed.store(true, Ordering::SeqCst);
            shared.fail_pending(GAVE_UP);
            let _ = events.send(TransportEvent::Manager(ManagerEvent::ReconnectFailed));
            break;
        }
        let delay = policy.delay_for(attempt);
        tracing::info!(%url, attempt, ?delay, "ws: reconnecting");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = shared.shutdown.notified() => break,
        }
        let _ = events.send(TransportEvent::Manager(ManagerEvent::ReconnectAttempt(attempt)));
    }
}

/// Pump one connection until it ends. Returns the disconnect reason.
async fn serve(
    shared: &Shared,
    stream: WsStream,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound: &mut mpsc::UnboundedReceiver<Frame>,
) -> String {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            () = shared.shutdown.notified() => {
                let _ = sink.send(Message::Close(None)).await;
                return "io client disconnect".to_owned();
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    return "io client disconnect".to_owned();
                };
                if !shared.is_pending(&frame.id) {
                    continue;
                }
                if let Err(error) = sink.send(Message::Binary(encode_frame(&frame).into())).await {
                    return format!("transport error: {error}");
                }
            }
            message = source.next() => match message {
                None => return "transport close".to_owned(),
                Some(Err(error)) => return format!("transport error: {error}"),
                Some(Ok(Message::Binary(bytes))) => shared.handle_frame(&bytes, events),
                Some(Ok(Message::Close(_))) => return "io server disconnect".to_owned(),
                Some(Ok(_)) => {}
            }
        }
    }
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_pending(&self, id: &str) -> bool {
        self.pending.lock().contains_key(id)
    }

    /// Route one inbound frame to its waiting request or to the listeners.
    fn handle_frame(&self, bytes: &[u8], events: &mpsc::UnboundedSender<TransportEvent>) {
        let frame = match decode_frame(bytes) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(%error, "ws: dropping undecodable frame");
                return;
            }
        };
        match frame.status {
            Status::Event => {
                if self.attached.lock().contains(frame.name.as_str()) {
                    let _ = events.send(TransportEvent::Push { name: frame.name, data: frame.data });
                }
            }
            Status::Done | Status::Error => {
                let Some(reply) = frame.parent_id.as_deref().and_then(|id| self.pending.lock().remove(id)) else {
                    tracing::debug!(name = %frame.name, "ws: reply without waiting request");
                    return;
                };
                let result = if frame.status == Status::Done { Ok(frame.data) } else { Err(remote_error(&frame.data)) };
                let _ = reply.send(result);
            }
            Status::Request => tracing::warn!(name = %frame.name, "ws: ignoring request frame from server"),
        }
    }

    fn fail_pending(&self, reason: &str) {
        let pending: Vec<Reply> = self.pending.lock().drain().map(|(_, reply)| reply).collect();
        for reply in pending {
            let _ = reply.send(Err(EmitError::Transport(reason.to_owned())));
        }
    }
}

fn remote_error(data: &Value) -> EmitError {
    let message = data.get("message").and_then(Value::as_str).unwrap_or("request failed").to_owned();
    let name = data.get("name").and_then(Value::as_str).map(str::to_owned);
    EmitError::Remote { name, message }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
