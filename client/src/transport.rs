//! The seam between the session and the socket.
//!
//! A [`Transport`] owns the connection: it connects, reconnects with backoff,
//! matches replies to requests and forwards the events listeners attached.
//! The session never sees sockets or frames, only [`TransportEvent`]s and
//! request results.

use serde_json::Value;
use tokio::sync::mpsc;

/// Where a transport subscription is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    /// Events of the connection manager, independent of any session.
    Manager,
    /// Events of the protocol namespace: pushes and the connection lifecycle.
    Namespace,
}

/// Lifecycle events of the connection manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagerEvent {
    Error(String),
    /// Reconnected after the given number of attempts.
    Reconnect(u32),
    ReconnectAttempt(u32),
    ReconnectError(String),
    /// Gave up reconnecting.
    ReconnectFailed,
}

/// Everything a transport reports to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Connect,
    /// Connection lost, with the reason.
    Disconnect(String),
    ConnectError(String),
    Manager(ManagerEvent),
    /// Server push, still in wire naming.
    Push { name: String, data: Value },
}

/// Failure of a single request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// The server answered with an error.
    #[error("{message}")]
    Remote { name: Option<String>, message: String },
    /// The request could not be delivered or the connection dropped before
    /// the reply arrived.
    #[error("{0}")]
    Transport(String),
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Subscribe to a wire event. Only attached events are forwarded.
    fn attach(&self, scope: ListenerScope, name: &'static str);

    /// Start connecting. Called once; the receiver yields events until the
    /// transport is closed.
    fn open(&self) -> mpsc::UnboundedReceiver<TransportEvent>;

    /// Send one request and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Remote`] for server rejections and
    /// [`EmitError::Transport`] when the request cannot complete.
    async fn emit(&self, name: &str, data: Value) -> Result<Value, EmitError>;

    /// Disconnect for good. Pending and later requests fail.
    fn close(&self);
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;

    type Responder = Box<dyn Fn(&str, &Value) -> Option<Result<Value, EmitError>> + Send + Sync>;

    /// A request the test has to answer by hand.
    pub struct PendingRequest {
        pub name: String,
        pub data: Value,
        reply: oneshot::Sender<Result<Value, EmitError>>,
    }

    impl PendingRequest {
        pub fn respond(self, data: Value) {
            let _ = self.reply.send(Ok(data));
        }

        pub fn fail(self, error: EmitError) {
            let _ = self.reply.send(Err(error));
        }
    }

    /// In-process transport driven by the test.
    ///
    /// Requests are answered by the responder installed with
    /// [`MockTransport::respond_with`]; anything it declines is queued and
    /// handed out by [`MockTransport::next_request`].
    pub struct MockTransport {
        attached: Mutex<Vec<(ListenerScope, &'static str)>>,
        events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
        requests: Mutex<Vec<(String, Value)>>,
        responder: Mutex<Option<Arc<Responder>>>,
        pending_tx: mpsc::UnboundedSender<PendingRequest>,
        pending_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PendingRequest>>,
        closed: AtomicBool,
    }

    impl MockTransport {
        #[must_use]
        pub fn new() -> Arc<Self> {
            let (pending_tx, pending_rx) = mpsc::unbounded_channel();
            Arc::new(Self {
                attached: Mutex::new(Vec::new()),
                events: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
                responder: Mutex::new(None),
                pending_tx,
                pending_rx: tokio::sync::Mutex::new(pending_rx),
                closed: AtomicBool::new(false),
            })
        }

        /// Answer matching requests immediately. Returning `None` queues the
        /// request for [`Self::next_request`].
        pub fn respond_with(
            &self,
            responder: impl Fn(&str, &Value) -> Option<Result<Value, EmitError>> + Send + Sync + 'static,
        ) {
            *self.responder.lock() = Some(Arc::new(Box::new(responder)));
        }

        pub async fn next_request(&self) -> PendingRequest {
            self.pending_rx.lock().await.recv().await.expect("mock transport request channel closed")
        }

        pub fn push(&self, event: TransportEvent) {
            if let Some(tx) = self.events.lock().as_ref() {
                let _ = tx.send(event);
            }
        }

        pub fn connect(&self) {
            self.push(TransportEvent::Connect);
        }

        pub fn disconnect(&self, reason: &str) {
            self.push(TransportEvent::Disconnect(reason.to_owned()));
        }

        pub fn server_push(&self, name: &str, data: Value) {
            self.push(TransportEvent::Push { name: name.to_owned(), data });
        }

        #[must_use]
        pub fn attached(&self) -> Vec<(ListenerScope, &'static str)> {
            self.attached.lock().clone()
        }

        /// Every request seen so far, in wire naming.
        #[must_use]
        pub fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().clone()
        }

        #[must_use]
        pub fn request_names(&self) -> Vec<String> {
            self.requests.lock().iter().map(|(name, _)| name.clone()).collect()
        }

        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        fn attach(&self, scope: ListenerScope, name: &'static str) {
            self.attached.lock().push((scope, name));
        }

        fn open(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.events.lock() = Some(tx);
            rx
        }

        async fn emit(&self, name: &str, data: Value) -> Result<Value, EmitError> {
            if self.is_closed() {
                return Err(EmitError::Transport("transport closed".to_owned()));
            }
            self.requests.lock().push((name.to_owned(), data.clone()));

            let responder = self.responder.lock().clone();
            if let Some(result) = responder.and_then(|respond| respond(name, &data)) {
                return result;
            }

            let (reply, rx) = oneshot::channel();
            let _ = self.pending_tx.send(PendingRequest { name: name.to_owned(), data, reply });
            rx.await.unwrap_or_else(|_| Err(EmitError::Transport("request dropped".to_owned())))
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
            self.events.lock().take();
        }
    }
}
