//! The realtime session: one connection, one optional pad, one store.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`Client`] owns a [`Transport`], the [`ListenerRegistry`] and the
//! [`Store`]. Everything that reaches the store goes through the registry:
//! the session registers its own store handlers first, so by the time user
//! listeners run the store already reflects the event.
//!
//! DESIGN
//! ======
//! - An inbound pump task drains transport events, translates pushes into the
//!   current protocol shape and dispatches them. It only holds a weak
//!   reference, so dropping the last `Client` tears the session down.
//! - Requests wrap the transport round trip with `loadStart`/`emit` before
//!   and `emitResolve`/`emitReject`/`loadEnd` after. `loadEnd` is fired by a
//!   drop guard, so a cancelled request still balances the loading counter.
//! - The store lock is only taken inside short synchronous helpers and is
//!   never held while handlers run or across an await.
//! - Route submissions carry a per-slot generation. A reply is only applied
//!   if no newer submission (or clear) for the same slot started meanwhile.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use facilmap_protocol::types::{
    Bbox, BboxWithZoom, FindOnMapQuery, FindPadsQuery, FindPadsResult, FindQuery, GetPadQuery, Line, LineCreate,
    LineExportRequest, LineTemplateRequest, LineToRouteCreate, LineUpdate, Marker, MarkerCreate, MarkerUpdate,
    ObjectWithId, PadCreate, PadData, PadId, PadUpdate, PagedResults, Route, RouteClear, RouteCreate,
    RouteExportRequest, RouteInfo, RouteRequest, Type, TypeCreate, TypeUpdate, View, ViewCreate, ViewUpdate,
};
use facilmap_protocol::{
    Envelope, ProtocolError, ProtocolVersion, RequestName, decode_event, decode_response, encode_request,
};
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, EventName, ListenerId, ListenerRegistry};
use crate::store::{PadSnapshot, ReplayPlan, RouteWithTrackPoints, SessionState, Store};
use crate::transport::{ManagerEvent, Transport, TransportEvent};
use crate::ws::WsTransport;

/// Events the store reacts to. Registered before any user listener.
const STORE_EVENTS: [EventName; 18] = [
    EventName::PadData,
    EventName::DeletePad,
    EventName::Marker,
    EventName::DeleteMarker,
    EventName::Line,
    EventName::DeleteLine,
    EventName::LinePoints,
    EventName::RoutePoints,
    EventName::RoutePointsWithId,
    EventName::View,
    EventName::DeleteView,
    EventName::Type,
    EventName::DeleteType,
    EventName::History,
    EventName::Disconnect,
    EventName::Connect,
    EventName::LoadStart,
    EventName::LoadEnd,
];

/// Reason reported when the session is closed locally.
const CLIENT_DISCONNECT: &str = "io client disconnect";

type ReplayStep<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Handle to a realtime session. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    version: ProtocolVersion,
    transport: Arc<dyn Transport>,
    registry: ListenerRegistry,
    store: Mutex<Store>,
    revision: watch::Sender<u64>,
    /// Latest submission per route slot. Generations come from one counter,
    /// so a slot that was cleared and reused never repeats a generation.
    route_generations: Mutex<HashMap<Option<String>, u64>>,
    next_route_generation: AtomicU64,
    pump: Mutex<Option<JoinHandle<()>>>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Client {
    /// Connect to the server over a websocket.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the server URL cannot be turned into
    /// a socket URL.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = WsTransport::new(&config)?;
        Ok(Self::with_transport(&config, Arc::new(transport)))
    }

    /// Start a session over an existing transport. Must be called inside a
    /// tokio runtime.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let version = config.protocol;
        let attach_transport = Arc::clone(&transport);
        let registry = ListenerRegistry::new(move |name: EventName| {
            if let Some((scope, wire)) = name.attach_target(version) {
                attach_transport.attach(scope, wire);
            }
        });

        let store = Store::new(config.server.clone(), config.pad_id.clone());
        let (revision, _) = watch::channel(store.revision());
        let inner = Arc::new(Inner {
            version,
            transport,
            registry,
            store: Mutex::new(store),
            revision,
            route_generations: Mutex::new(HashMap::new()),
            next_route_generation: AtomicU64::new(0),
            pump: Mutex::new(None),
        });

        for name in STORE_EVENTS {
            let weak = Arc::downgrade(&inner);
            inner.registry.on(name, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.apply(event);
                }
            });
        }
        let weak = Arc::downgrade(&inner);
        inner.registry.once(EventName::Connect, move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.registry.dispatch(&ClientEvent::LoadEnd);
            }
        });

        let rx = inner.transport.open();
        let handle = tokio::spawn(pump(Arc::downgrade(&inner), rx));
        *inner.pump.lock() = Some(handle);

        Self { inner }
    }

    /// Close the connection for good. Later requests fail with a transport
    /// error.
    pub fn disconnect(&self) {
        self.inner.shutdown();
        if !self.read(|store| store.session().disconnected) {
            self.inner.registry.dispatch(&ClientEvent::Disconnect(CLIENT_DISCONNECT.to_owned()));
        }
    }
}

async fn pump(session: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<TransportEvent>) {
    // Give the caller a chance to register listeners before the first event.
    tokio::task::yield_now().await;
    if let Some(inner) = session.upgrade() {
        inner.registry.dispatch(&ClientEvent::LoadStart);
    }
    while let Some(event) = rx.recv().await {
        let Some(inner) = session.upgrade() else {
            break;
        };
        if let Some(event) = inner.translate(event) {
            inner.registry.dispatch(&event);
        }
    }
}

impl Inner {
    fn translate(&self, event: TransportEvent) -> Option<ClientEvent> {
        Some(match event {
            TransportEvent::Connect => ClientEvent::Connect,
            TransportEvent::Disconnect(reason) => ClientEvent::Disconnect(reason),
            TransportEvent::ConnectError(message) => ClientEvent::ConnectError(message),
            TransportEvent::Manager(ManagerEvent::Error(message)) => ClientEvent::Error(message),
            TransportEvent::Manager(ManagerEvent::Reconnect(attempt)) => ClientEvent::Reconnect(attempt),
            TransportEvent::Manager(ManagerEvent::ReconnectAttempt(attempt)) => ClientEvent::ReconnectAttempt(attempt),
            TransportEvent::Manager(ManagerEvent::ReconnectError(message)) => ClientEvent::ReconnectError(message),
            TransportEvent::Manager(ManagerEvent::ReconnectFailed) => ClientEvent::ReconnectFailed,
            TransportEvent::Push { name, data } => {
                let decoded = decode_event(self.version, &name, data)
                    .and_then(|(push, payload)| ClientEvent::from_push(push, payload));
                match decoded {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!(event = %name, %error, "client: dropping malformed push");
                        return None;
                    }
                }
            }
        })
    }

    /// Run a store mutation and publish the new revision if it changed.
    fn mutate<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut store = self.store.lock();
        let before = store.revision();
        let out = f(&mut store);
        if store.revision() != before {
            self.revision.send_replace(store.revision());
        }
        out
    }

    fn apply(self: &Arc<Self>, event: &ClientEvent) {
        let Some(plan) = self.mutate(|store| store.apply(event)) else {
            return;
        };
        let client = Client { inner: Arc::clone(self) };
        tokio::spawn(async move { client.replay(plan).await });
    }

    fn begin_route(&self, slot: &Option<String>) -> u64 {
        let generation = self.next_route_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.route_generations.lock().insert(slot.clone(), generation);
        generation
    }

    /// Forget the slot, so any submission still in flight for it is stale.
    fn end_route(&self, slot: &Option<String>) {
        self.route_generations.lock().remove(slot);
    }

    fn is_current_route(&self, slot: &Option<String>, generation: u64) -> bool {
        self.route_generations.lock().get(slot).copied() == Some(generation)
    }

    fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        self.transport.close();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fires `loadStart` when created and `loadEnd` when dropped.
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn new(inner: &'a Inner) -> Self {
        inner.registry.dispatch(&ClientEvent::LoadStart);
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.registry.dispatch(&ClientEvent::LoadEnd);
    }
}

// =============================================================================
// LISTENERS AND STATE
// =============================================================================

impl Client {
    pub fn on(&self, name: EventName, handler: impl Fn(&ClientEvent) + Send + Sync + 'static) -> ListenerId {
        self.inner.registry.on(name, handler)
    }

    pub fn once(&self, name: EventName, handler: impl Fn(&ClientEvent) + Send + Sync + 'static) -> ListenerId {
        self.inner.registry.once(name, handler)
    }

    pub fn remove_listener(&self, name: EventName, id: ListenerId) -> bool {
        self.inner.registry.remove_listener(name, id)
    }

    /// Read the store. The closure must not call back into the client.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.inner.store.lock())
    }

    #[must_use]
    pub fn session(&self) -> SessionState {
        self.read(|store| store.session().clone())
    }

    #[must_use]
    pub fn snapshot(&self) -> PadSnapshot {
        self.read(|store| store.data().clone())
    }

    #[must_use]
    pub fn pad_id(&self) -> Option<PadId> {
        self.read(|store| store.session().pad_id.clone())
    }

    #[must_use]
    pub fn pad_data(&self) -> Option<PadData> {
        self.read(|store| store.data().pad_data.clone())
    }

    #[must_use]
    pub fn route(&self, route_id: Option<&str>) -> Option<RouteWithTrackPoints> {
        self.read(|store| store.route(route_id).cloned())
    }

    /// Receiver that changes whenever the store does.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    #[must_use]
    pub fn protocol(&self) -> ProtocolVersion {
        self.inner.version
    }
}

// =============================================================================
// REQUEST PLUMBING
// =============================================================================

impl Client {
    async fn request(&self, name: RequestName, payload: Value) -> Result<Value, ClientError> {
        let version = self.inner.version;
        let _loading = LoadingGuard::new(&self.inner);
        self.inner.registry.dispatch(&ClientEvent::Emit { name, data: payload.clone() });

        let (wire, payload) = encode_request(version, name, payload);
        tracing::debug!(request = wire, %version, "client: sending request");
        match self.inner.transport.emit(wire, payload).await {
            Ok(raw) => {
                let data = decode_response(version, name, raw);
                self.inner.registry.dispatch(&ClientEvent::EmitResolve { name, data: data.clone() });
                Ok(data)
            }
            Err(error) => {
                let error = ClientError::from_emit(version, error);
                self.inner.registry.dispatch(&ClientEvent::EmitReject { name, error: error.clone() });
                Err(error)
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        name: RequestName,
        payload: &(impl Serialize + Sync),
    ) -> Result<T, ClientError> {
        let data = self.request(name, to_payload(payload)?).await?;
        parse(name, data)
    }

    async fn call_unit(&self, name: RequestName, payload: Value) -> Result<(), ClientError> {
        self.request(name, payload).await.map(drop)
    }

    /// Apply a batch envelope reply through the live event path.
    fn receive_multiple(&self, data: Value) {
        let envelope = Envelope::from_value(data);
        if !envelope.unknown.is_empty() {
            tracing::warn!(keys = ?envelope.unknown, "client: ignoring unknown envelope entries");
        }
        for (push, payload) in envelope.iter() {
            match ClientEvent::from_push(push, payload.clone()) {
                Ok(event) => self.inner.registry.dispatch(&event),
                Err(error) => tracing::warn!(event = %push, %error, "client: dropping malformed envelope entry"),
            }
        }
    }

    async fn attach_pad(&self, pad_id: PadId) -> Result<(), ClientError> {
        self.inner.mutate(|store| store.begin_pad_attach(pad_id.clone()));
        match self.request(RequestName::SetPadId, Value::String(pad_id)).await {
            Ok(data) => {
                self.receive_multiple(data);
                Ok(())
            }
            Err(error) => {
                self.inner.mutate(|store| store.set_server_error(error.clone()));
                self.inner.registry.dispatch(&ClientEvent::ServerError(error.clone()));
                Err(error)
            }
        }
    }

    async fn submit_route(
        &self,
        name: RequestName,
        slot: Option<String>,
        payload: Value,
    ) -> Result<Option<RouteWithTrackPoints>, ClientError> {
        let generation = self.inner.begin_route(&slot);
        let data = self.request(name, payload).await?;
        if data.is_null() || !self.inner.is_current_route(&slot, generation) {
            return Ok(None);
        }
        let route: Route = parse(name, data)?;
        let route = RouteWithTrackPoints::from_route(slot, route);
        self.inner.mutate(|store| store.set_route(route.clone()));
        self.inner.registry.dispatch(&ClientEvent::Route(route.clone()));
        Ok(Some(route))
    }

    async fn replay(&self, plan: ReplayPlan) {
        let mut steps: Vec<ReplayStep<'_>> = Vec::new();
        if let Some(pad_id) = plan.pad_id {
            steps.push(Box::pin(async move {
                if let Err(error) = self.attach_pad(pad_id).await {
                    tracing::debug!(%error, "client: pad attach failed after connect");
                }
            }));
        }
        if let Some(bbox) = plan.bbox {
            steps.push(Box::pin(async move {
                if let Err(error) = self.update_bbox(bbox).await {
                    tracing::error!(%error, "client: error updating bbox");
                }
            }));
        }
        if plan.listen_to_history {
            steps.push(Box::pin(async move {
                if let Err(error) = self.listen_to_history().await {
                    tracing::error!(%error, "client: error listening to history");
                }
            }));
        }
        for route in plan.routes {
            steps.push(Box::pin(async move {
                if let Err(error) = self.set_route(route).await {
                    tracing::error!(%error, "client: error setting route");
                }
            }));
        }
        join_all(steps).await;
    }
}

fn to_payload(payload: &impl Serialize) -> Result<Value, ClientError> {
    serde_json::to_value(payload).map_err(|error| ClientError::Protocol(error.to_string()))
}

fn parse<T: DeserializeOwned>(name: RequestName, data: Value) -> Result<T, ClientError> {
    serde_json::from_value(data)
        .map_err(|source| ClientError::from(ProtocolError::Payload { name: name.to_string(), source }))
}

// =============================================================================
// REQUESTS
// =============================================================================

impl Client {
    /// Attach the session to a pad.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::PadIdAlreadySet`] if a pad is already attached,
    /// or the server's rejection (also stored as `server_error`).
    pub async fn set_pad_id(&self, pad_id: impl Into<PadId>) -> Result<(), ClientError> {
        if self.pad_id().is_some() {
            return Err(ClientError::PadIdAlreadySet);
        }
        self.attach_pad(pad_id.into()).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn update_bbox(&self, bbox: BboxWithZoom) -> Result<(), ClientError> {
        self.inner.mutate(|store| store.set_bbox(bbox));
        let data = self.request(RequestName::UpdateBbox, to_payload(&bbox)?).await?;
        self.receive_multiple(data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn get_pad(&self, query: GetPadQuery) -> Result<Option<FindPadsResult>, ClientError> {
        self.call(RequestName::GetPad, &query).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn find_pads(&self, query: FindPadsQuery) -> Result<PagedResults<FindPadsResult>, ClientError> {
        self.call(RequestName::FindPads, &query).await
    }

    /// Create a pad and attach to it with admin rights.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn create_pad(&self, pad: PadCreate) -> Result<(), ClientError> {
        let data = self.request(RequestName::CreatePad, to_payload(&pad)?).await?;
        self.inner.mutate(Store::mark_pad_created);
        self.receive_multiple(data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn edit_pad(&self, update: PadUpdate) -> Result<PadData, ClientError> {
        self.call(RequestName::EditPad, &update).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn delete_pad(&self) -> Result<(), ClientError> {
        self.call_unit(RequestName::DeletePad, Value::Null).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn listen_to_history(&self) -> Result<(), ClientError> {
        let data = self.request(RequestName::ListenToHistory, Value::Null).await?;
        self.inner.mutate(|store| store.set_listening_to_history(true));
        self.receive_multiple(data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn stop_listening_to_history(&self) -> Result<(), ClientError> {
        self.inner.mutate(|store| store.set_listening_to_history(false));
        self.call_unit(RequestName::StopListeningToHistory, Value::Null).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn revert_history_entry(&self, entry: ObjectWithId) -> Result<(), ClientError> {
        let data = self.request(RequestName::RevertHistoryEntry, to_payload(&entry)?).await?;
        self.inner.mutate(Store::clear_history);
        self.receive_multiple(data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn get_marker(&self, marker: ObjectWithId) -> Result<Marker, ClientError> {
        let marker: Marker = self.call(RequestName::GetMarker, &marker).await?;
        self.inner.mutate(|store| store.upsert_marker(marker.clone()));
        Ok(marker)
    }

    /// Create a marker. It is stored right away, even if it lies outside the
    /// current bbox.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn add_marker(&self, marker: MarkerCreate) -> Result<Marker, ClientError> {
        let marker: Marker = self.call(RequestName::AddMarker, &marker).await?;
        self.inner.mutate(|store| store.upsert_marker(marker.clone()));
        Ok(marker)
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn edit_marker(&self, update: MarkerUpdate) -> Result<Marker, ClientError> {
        self.call(RequestName::EditMarker, &update).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn delete_marker(&self, marker: ObjectWithId) -> Result<Marker, ClientError> {
        self.call(RequestName::DeleteMarker, &marker).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn get_line_template(&self, request: LineTemplateRequest) -> Result<Line, ClientError> {
        self.call(RequestName::GetLineTemplate, &request).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn add_line(&self, line: LineCreate) -> Result<Line, ClientError> {
        self.call(RequestName::AddLine, &line).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn edit_line(&self, update: LineUpdate) -> Result<Line, ClientError> {
        self.call(RequestName::EditLine, &update).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn delete_line(&self, line: ObjectWithId) -> Result<Line, ClientError> {
        self.call(RequestName::DeleteLine, &line).await
    }

    /// Export a line as GPX or GeoJSON text.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn export_line(&self, request: LineExportRequest) -> Result<String, ClientError> {
        self.call(RequestName::ExportLine, &request).await
    }

    /// Search places. Returns the raw result list, or file contents when
    /// `load_urls` resolved a URL.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn find(&self, query: FindQuery) -> Result<Value, ClientError> {
        self.call(RequestName::Find, &query).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn find_on_map(&self, query: FindOnMapQuery) -> Result<Value, ClientError> {
        self.call(RequestName::FindOnMap, &query).await
    }

    /// Calculate a route without storing it.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn get_route(&self, request: RouteRequest) -> Result<RouteInfo, ClientError> {
        self.call(RequestName::GetRoute, &request).await
    }

    /// Calculate and store a route in its slot. `Ok(None)` means a newer
    /// submission for the same slot superseded this one.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn set_route(&self, route: RouteCreate) -> Result<Option<RouteWithTrackPoints>, ClientError> {
        let slot = route.route_id.clone();
        self.submit_route(RequestName::SetRoute, slot, to_payload(&route)?).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn clear_route(&self, clear: RouteClear) -> Result<(), ClientError> {
        let slot = clear.route_id.clone();
        self.inner.end_route(&slot);
        let cleared = self.inner.mutate(|store| store.clear_route(slot.as_deref()));
        if slot.is_none() && !cleared {
            return Ok(());
        }
        self.inner.registry.dispatch(&ClientEvent::ClearRoute(clear.clone()));
        self.call_unit(RequestName::ClearRoute, to_payload(&clear)?).await
    }

    /// Turn a stored line into an editable route.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn line_to_route(&self, request: LineToRouteCreate) -> Result<Option<RouteWithTrackPoints>, ClientError> {
        let slot = request.route_id.clone();
        self.submit_route(RequestName::LineToRoute, slot, to_payload(&request)?).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn export_route(&self, request: RouteExportRequest) -> Result<String, ClientError> {
        self.call(RequestName::ExportRoute, &request).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn add_type(&self, ty: TypeCreate) -> Result<Type, ClientError> {
        self.call(RequestName::AddType, &ty).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn edit_type(&self, update: TypeUpdate) -> Result<Type, ClientError> {
        self.call(RequestName::EditType, &update).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn delete_type(&self, ty: ObjectWithId) -> Result<Type, ClientError> {
        self.call(RequestName::DeleteType, &ty).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn add_view(&self, view: ViewCreate) -> Result<View, ClientError> {
        self.call(RequestName::AddView, &view).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn edit_view(&self, update: ViewUpdate) -> Result<View, ClientError> {
        self.call(RequestName::EditView, &update).await
    }

    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn delete_view(&self, view: ObjectWithId) -> Result<View, ClientError> {
        self.call(RequestName::DeleteView, &view).await
    }

    /// Rough area of the caller's IP address, if the server knows it.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error of the request.
    pub async fn geoip(&self) -> Result<Option<Bbox>, ClientError> {
        let data = self.request(RequestName::Geoip, Value::Null).await?;
        parse(RequestName::Geoip, data)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("version", &self.inner.version)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
