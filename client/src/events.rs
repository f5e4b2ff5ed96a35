//! Client events and the listener registry.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every state change the client reports goes through one dispatch path:
//! server pushes, connection lifecycle events, connection-manager events and
//! locally synthesized events (`loadStart`, `route`, `emit`, ...). Listeners
//! cannot tell where an event came from.
//!
//! DESIGN
//! ======
//! Handlers live in a fixed table indexed by [`EventName`]. The first
//! listener for a name the transport carries asks the transport to attach one
//! subscription for it; later listeners share that subscription. Dispatch
//! snapshots the handler list and releases the lock before calling anything,
//! so handlers may register, remove or dispatch re-entrantly.
//!
//! Marker and line payloads are typed with a [`facilmap_protocol::SafeMap`]
//! data bag, so handlers only ever see the clean form.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use facilmap_protocol::types::{
    HistoryEntry, Line, LinePoints, Marker, ObjectWithId, PadData, RouteClear, RoutePointsWithId, TrackPoint, Type,
    View,
};
use facilmap_protocol::{ProtocolError, ProtocolVersion, PushEvent, RequestName};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ClientError;
use crate::store::RouteWithTrackPoints;
use crate::transport::ListenerScope;

// =============================================================================
// EVENT NAMES
// =============================================================================

/// Every event a listener can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    PadData,
    DeletePad,
    Marker,
    DeleteMarker,
    Line,
    DeleteLine,
    LinePoints,
    RoutePoints,
    RoutePointsWithId,
    View,
    DeleteView,
    Type,
    DeleteType,
    History,
    Connect,
    Disconnect,
    ConnectError,
    Error,
    Reconnect,
    ReconnectAttempt,
    ReconnectError,
    ReconnectFailed,
    LoadStart,
    LoadEnd,
    Route,
    ClearRoute,
    Emit,
    EmitResolve,
    EmitReject,
    ServerError,
}

pub const EVENT_COUNT: usize = 30;

/// All event names, in declaration order.
pub const EVENT_NAMES: [EventName; EVENT_COUNT] = {
    use EventName as E;
    [
        E::PadData,
        E::DeletePad,
        E::Marker,
        E::DeleteMarker,
        E::Line,
        E::DeleteLine,
        E::LinePoints,
        E::RoutePoints,
        E::RoutePointsWithId,
        E::View,
        E::DeleteView,
        E::Type,
        E::DeleteType,
        E::History,
        E::Connect,
        E::Disconnect,
        E::ConnectError,
        E::Error,
        E::Reconnect,
        E::ReconnectAttempt,
        E::ReconnectError,
        E::ReconnectFailed,
        E::LoadStart,
        E::LoadEnd,
        E::Route,
        E::ClearRoute,
        E::Emit,
        E::EmitResolve,
        E::EmitReject,
        E::ServerError,
    ]
};

impl EventName {
    /// Client-facing event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PadData => "padData",
            Self::DeletePad => "deletePad",
            Self::Marker => "marker",
            Self::DeleteMarker => "deleteMarker",
            Self::Line => "line",
            Self::DeleteLine => "deleteLine",
            Self::LinePoints => "linePoints",
            Self::RoutePoints => "routePoints",
            Self::RoutePointsWithId => "routePointsWithId",
            Self::View => "view",
            Self::DeleteView => "deleteView",
            Self::Type => "type",
            Self::DeleteType => "deleteType",
            Self::History => "history",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ConnectError => "connect_error",
            Self::Error => "error",
            Self::Reconnect => "reconnect",
            Self::ReconnectAttempt => "reconnect_attempt",
            Self::ReconnectError => "reconnect_error",
            Self::ReconnectFailed => "reconnect_failed",
            Self::LoadStart => "loadStart",
            Self::LoadEnd => "loadEnd",
            Self::Route => "route",
            Self::ClearRoute => "clearRoute",
            Self::Emit => "emit",
            Self::EmitResolve => "emitResolve",
            Self::EmitReject => "emitReject",
            Self::ServerError => "serverError",
        }
    }

    #[must_use]
    pub fn from_push(event: PushEvent) -> Self {
        match event {
            PushEvent::PadData => Self::PadData,
            PushEvent::DeletePad => Self::DeletePad,
            PushEvent::View => Self::View,
            PushEvent::DeleteView => Self::DeleteView,
            PushEvent::Type => Self::Type,
            PushEvent::DeleteType => Self::DeleteType,
            PushEvent::Marker => Self::Marker,
            PushEvent::DeleteMarker => Self::DeleteMarker,
            PushEvent::Line => Self::Line,
            PushEvent::DeleteLine => Self::DeleteLine,
            PushEvent::LinePoints => Self::LinePoints,
            PushEvent::RoutePoints => Self::RoutePoints,
            PushEvent::RoutePointsWithId => Self::RoutePointsWithId,
            PushEvent::History => Self::History,
        }
    }

    /// The server push this name stands for, if it is one.
    #[must_use]
    pub fn push_event(self) -> Option<PushEvent> {
        Some(match self {
            Self::PadData => PushEvent::PadData,
            Self::DeletePad => PushEvent::DeletePad,
            Self::Marker => PushEvent::Marker,
            Self::DeleteMarker => PushEvent::DeleteMarker,
            Self::Line => PushEvent::Line,
            Self::DeleteLine => PushEvent::DeleteLine,
            Self::LinePoints => PushEvent::LinePoints,
            Self::RoutePoints => PushEvent::RoutePoints,
            Self::RoutePointsWithId => PushEvent::RoutePointsWithId,
            Self::View => PushEvent::View,
            Self::DeleteView => PushEvent::DeleteView,
            Self::Type => PushEvent::Type,
            Self::DeleteType => PushEvent::DeleteType,
            Self::History => PushEvent::History,
            _ => return None,
        })
    }

    /// Where the transport subscription for this name lives and its wire
    /// name. `None` for events that only ever fire locally.
    #[must_use]
    pub fn attach_target(self, version: ProtocolVersion) -> Option<(ListenerScope, &'static str)> {
        if let Some(push) = self.push_event() {
            return Some((ListenerScope::Namespace, push.wire_name(version)));
        }
        match self {
            Self::Connect | Self::Disconnect | Self::ConnectError => Some((ListenerScope::Namespace, self.as_str())),
            Self::Error | Self::Reconnect | Self::ReconnectAttempt | Self::ReconnectError | Self::ReconnectFailed => {
                Some((ListenerScope::Manager, self.as_str()))
            }
            _ => None,
        }
    }

    /// Whether a first listener has to attach a transport subscription.
    #[must_use]
    pub fn carried_by_transport(self) -> bool {
        self.attach_target(ProtocolVersion::default()).is_some()
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// An event together with its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    PadData(PadData),
    DeletePad,
    Marker(Marker),
    DeleteMarker(ObjectWithId),
    Line(Line),
    DeleteLine(ObjectWithId),
    LinePoints(LinePoints),
    RoutePoints(Vec<TrackPoint>),
    RoutePointsWithId(RoutePointsWithId),
    View(View),
    DeleteView(ObjectWithId),
    Type(Type),
    DeleteType(ObjectWithId),
    History(HistoryEntry),
    Connect,
    Disconnect(String),
    ConnectError(String),
    Error(String),
    Reconnect(u32),
    ReconnectAttempt(u32),
    ReconnectError(String),
    ReconnectFailed,
    LoadStart,
    LoadEnd,
    Route(RouteWithTrackPoints),
    ClearRoute(RouteClear),
    Emit { name: RequestName, data: Value },
    EmitResolve { name: RequestName, data: Value },
    EmitReject { name: RequestName, error: ClientError },
    ServerError(ClientError),
}

impl ClientEvent {
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::PadData(_) => EventName::PadData,
            Self::DeletePad => EventName::DeletePad,
            Self::Marker(_) => EventName::Marker,
            Self::DeleteMarker(_) => EventName::DeleteMarker,
            Self::Line(_) => EventName::Line,
            Self::DeleteLine(_) => EventName::DeleteLine,
            Self::LinePoints(_) => EventName::LinePoints,
            Self::RoutePoints(_) => EventName::RoutePoints,
            Self::RoutePointsWithId(_) => EventName::RoutePointsWithId,
            Self::View(_) => EventName::View,
            Self::DeleteView(_) => EventName::DeleteView,
            Self::Type(_) => EventName::Type,
            Self::DeleteType(_) => EventName::DeleteType,
            Self::History(_) => EventName::History,
            Self::Connect => EventName::Connect,
            Self::Disconnect(_) => EventName::Disconnect,
            Self::ConnectError(_) => EventName::ConnectError,
            Self::Error(_) => EventName::Error,
            Self::Reconnect(_) => EventName::Reconnect,
            Self::ReconnectAttempt(_) => EventName::ReconnectAttempt,
            Self::ReconnectError(_) => EventName::ReconnectError,
            Self::ReconnectFailed => EventName::ReconnectFailed,
            Self::LoadStart => EventName::LoadStart,
            Self::LoadEnd => EventName::LoadEnd,
            Self::Route(_) => EventName::Route,
            Self::ClearRoute(_) => EventName::ClearRoute,
            Self::Emit { .. } => EventName::Emit,
            Self::EmitResolve { .. } => EventName::EmitResolve,
            Self::EmitReject { .. } => EventName::EmitReject,
            Self::ServerError(_) => EventName::ServerError,
        }
    }

    /// Type a current-shape push payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Payload`] if the payload does not match the
    /// event's shape.
    pub fn from_push(event: PushEvent, payload: Value) -> Result<Self, ProtocolError> {
        Ok(match event {
            PushEvent::PadData => Self::PadData(parse(event, payload)?),
            PushEvent::DeletePad => Self::DeletePad,
            PushEvent::View => Self::View(parse(event, payload)?),
            PushEvent::DeleteView => Self::DeleteView(parse(event, payload)?),
            PushEvent::Type => Self::Type(parse(event, payload)?),
            PushEvent::DeleteType => Self::DeleteType(parse(event, payload)?),
            PushEvent::Marker => Self::Marker(parse(event, payload)?),
            PushEvent::DeleteMarker => Self::DeleteMarker(parse(event, payload)?),
            PushEvent::Line => Self::Line(parse(event, payload)?),
            PushEvent::DeleteLine => Self::DeleteLine(parse(event, payload)?),
            PushEvent::LinePoints => Self::LinePoints(parse(event, payload)?),
            PushEvent::RoutePoints => Self::RoutePoints(parse(event, payload)?),
            PushEvent::RoutePointsWithId => Self::RoutePointsWithId(parse(event, payload)?),
            PushEvent::History => Self::History(parse(event, payload)?),
        })
    }

    /// JSON rendering of the payload, for logs and the command line.
    #[must_use]
    pub fn payload_json(&self) -> Value {
        let rendered = match self {
            Self::PadData(v) => serde_json::to_value(v),
            Self::Marker(v) => serde_json::to_value(v),
            Self::DeleteMarker(v) | Self::DeleteLine(v) | Self::DeleteView(v) | Self::DeleteType(v) => {
                serde_json::to_value(v)
            }
            Self::Line(v) => serde_json::to_value(v),
            Self::LinePoints(v) => serde_json::to_value(v),
            Self::RoutePoints(v) => serde_json::to_value(v),
            Self::RoutePointsWithId(v) => serde_json::to_value(v),
            Self::View(v) => serde_json::to_value(v),
            Self::Type(v) => serde_json::to_value(v),
            Self::History(v) => serde_json::to_value(v),
            Self::Route(v) => serde_json::to_value(v),
            Self::ClearRoute(v) => serde_json::to_value(v),
            Self::Disconnect(reason)
            | Self::ConnectError(reason)
            | Self::Error(reason)
            | Self::ReconnectError(reason) => Ok(Value::String(reason.clone())),
            Self::Reconnect(attempt) | Self::ReconnectAttempt(attempt) => Ok(json!(attempt)),
            Self::Emit { name, data } | Self::EmitResolve { name, data } => {
                Ok(json!({ "name": name.to_string(), "data": data }))
            }
            Self::EmitReject { name, error } => Ok(json!({ "name": name.to_string(), "error": error.to_string() })),
            Self::ServerError(error) => Ok(Value::String(error.to_string())),
            Self::DeletePad | Self::Connect | Self::ReconnectFailed | Self::LoadStart | Self::LoadEnd => Ok(Value::Null),
        };
        rendered.unwrap_or(Value::Null)
    }
}

fn parse<T: DeserializeOwned>(event: PushEvent, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::Payload { name: event.to_string(), source })
}

// =============================================================================
// LISTENER REGISTRY
// =============================================================================

pub type Handler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::on`], used to remove the listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    once: bool,
    handler: Handler,
}

struct Slots {
    handlers: [Vec<Listener>; EVENT_COUNT],
    attached: [bool; EVENT_COUNT],
}

/// Ordered handler lists per event name, plus the transport attach state.
pub struct ListenerRegistry {
    slots: Mutex<Slots>,
    next_id: AtomicU64,
    attach: Box<dyn Fn(EventName) + Send + Sync>,
}

impl ListenerRegistry {
    /// `attach` runs once per transport-carried name, on its first listener.
    pub fn new(attach: impl Fn(EventName) + Send + Sync + 'static) -> Self {
        Self {
            slots: Mutex::new(Slots {
                handlers: std::array::from_fn(|_| Vec::new()),
                attached: [false; EVENT_COUNT],
            }),
            next_id: AtomicU64::new(1),
            attach: Box::new(attach),
        }
    }

    pub fn on(&self, name: EventName, handler: impl Fn(&ClientEvent) + Send + Sync + 'static) -> ListenerId {
        self.register(name, false, Arc::new(handler))
    }

    /// Like [`Self::on`], but the listener is removed before its first call.
    pub fn once(&self, name: EventName, handler: impl Fn(&ClientEvent) + Send + Sync + 'static) -> ListenerId {
        self.register(name, true, Arc::new(handler))
    }

    /// Returns whether a listener was removed. The transport subscription stays.
    pub fn remove_listener(&self, name: EventName, id: ListenerId) -> bool {
        let mut slots = self.slots.lock();
        let list = &mut slots.handlers[name as usize];
        let before = list.len();
        list.retain(|listener| listener.id != id);
        list.len() != before
    }

    #[must_use]
    pub fn listener_count(&self, name: EventName) -> usize {
        self.slots.lock().handlers[name as usize].len()
    }

    #[must_use]
    pub fn is_attached(&self, name: EventName) -> bool {
        self.slots.lock().attached[name as usize]
    }

    /// Call every listener of the event's name, in registration order.
    pub fn dispatch(&self, event: &ClientEvent) {
        let handlers: Vec<Handler> = {
            let mut slots = self.slots.lock();
            let list = &mut slots.handlers[event.name() as usize];
            let snapshot = list.iter().map(|listener| Arc::clone(&listener.handler)).collect();
            list.retain(|listener| !listener.once);
            snapshot
        };
        for handler in handlers {
            handler(event);
        }
    }

    fn register(&self, name: EventName, once: bool, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let first = {
            let mut slots = self.slots.lock();
            let idx = name as usize;
            let first = name.carried_by_transport() && !slots.attached[idx];
            if first {
                slots.attached[idx] = true;
            }
            slots.handlers[idx].push(Listener { id, once, handler });
            first
        };
        if first {
            (self.attach)(name);
        }
        id
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        let counts: Vec<_> = EVENT_NAMES
            .iter()
            .filter(|name| !slots.handlers[**name as usize].is_empty())
            .map(|name| (name.as_str(), slots.handlers[*name as usize].len()))
            .collect();
        f.debug_struct("ListenerRegistry").field("listeners", &counts).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
