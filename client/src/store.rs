//! Local mirror of one pad's server state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the single source of truth for everything the client knows:
//! session flags (connection, pad id, access level, loading counter) and the
//! pad's markers, lines, views, types, history and routes. It is mutated only
//! by the client's internal event handlers and by request continuations;
//! everyone else gets shared references through `Client::read`.
//!
//! Every mutation bumps [`Store::revision`] so observers can cheaply detect
//! change.

use std::collections::HashMap;

use facilmap_protocol::types::{
    BboxWithZoom, HistoryEntry, Id, Line, Marker, PadData, PadId, Route, RouteCreate, RouteInfo, Type, View, Writable,
};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::track_points::TrackPoints;

/// Most history entries kept; the oldest arrivals are evicted first.
pub const HISTORY_CAP: usize = 50;

// =============================================================================
// ENTITIES WITH GEOMETRY
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineWithTrackPoints {
    #[serde(flatten)]
    pub line: Line,
    pub track_points: TrackPoints,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWithTrackPoints {
    /// Slot of a named route; `None` for the singleton route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(flatten)]
    pub info: RouteInfo,
    pub track_points: TrackPoints,
}

impl RouteWithTrackPoints {
    /// Build from a server route, merging its points into a fresh sequence.
    #[must_use]
    pub fn from_route(route_id: Option<String>, route: Route) -> Self {
        let track_points = TrackPoints::merge(None, &route.track_points);
        Self { route_id, info: route.info, track_points }
    }

    /// Request that recalculates this route on the server.
    #[must_use]
    pub fn to_create(&self) -> RouteCreate {
        RouteCreate {
            route_points: self.info.route_points.clone(),
            mode: self.info.mode.clone(),
            route_id: self.route_id.clone(),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Connection and pad attachment state of the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub disconnected: bool,
    pub server: String,
    pub pad_id: Option<PadId>,
    pub bbox: Option<BboxWithZoom>,
    pub readonly: Option<bool>,
    pub writable: Option<Writable>,
    pub deleted: bool,
    pub server_error: Option<ClientError>,
    /// Requests (and the initial connect) in flight.
    pub loading: u32,
    pub listening_to_history: bool,
}

/// Objects of the attached pad.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PadSnapshot {
    pub pad_data: Option<PadData>,
    pub markers: HashMap<Id, Marker>,
    pub lines: HashMap<Id, LineWithTrackPoints>,
    pub views: HashMap<Id, View>,
    pub types: HashMap<Id, Type>,
    /// In arrival order.
    pub history: IndexMap<Id, HistoryEntry>,
    pub route: Option<RouteWithTrackPoints>,
    pub routes: HashMap<String, RouteWithTrackPoints>,
}

/// Subscriptions to re-establish after a (re)connect, in the order they are sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayPlan {
    pub pad_id: Option<PadId>,
    pub bbox: Option<BboxWithZoom>,
    pub listen_to_history: bool,
    /// Singleton route first, then named routes.
    pub routes: Vec<RouteCreate>,
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    session: SessionState,
    data: PadSnapshot,
    revision: u64,
}

impl Store {
    pub(crate) fn new(server: impl Into<String>, pad_id: Option<PadId>) -> Self {
        Self {
            session: SessionState { disconnected: true, server: server.into(), pad_id, ..SessionState::default() },
            data: PadSnapshot::default(),
            revision: 0,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn data(&self) -> &PadSnapshot {
        &self.data
    }

    /// Increases with every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn marker(&self, id: Id) -> Option<&Marker> {
        self.data.markers.get(&id)
    }

    #[must_use]
    pub fn line(&self, id: Id) -> Option<&LineWithTrackPoints> {
        self.data.lines.get(&id)
    }

    #[must_use]
    pub fn view(&self, id: Id) -> Option<&View> {
        self.data.views.get(&id)
    }

    #[must_use]
    pub fn type_(&self, id: Id) -> Option<&Type> {
        self.data.types.get(&id)
    }

    /// Route in the named slot, or the singleton route for `None`.
    #[must_use]
    pub fn route(&self, route_id: Option<&str>) -> Option<&RouteWithTrackPoints> {
        match route_id {
            Some(id) => self.data.routes.get(id),
            None => self.data.route.as_ref(),
        }
    }

    // =========================================================================
    // EVENT HANDLERS
    // =========================================================================

    /// Apply one event. Returns the subscriptions to replay when the event is
    /// a (re)connect.
    pub(crate) fn apply(&mut self, event: &ClientEvent) -> Option<ReplayPlan> {
        match event {
            ClientEvent::PadData(data) => self.apply_pad_data(data),
            ClientEvent::DeletePad => {
                self.session.readonly = Some(true);
                self.session.writable = Some(Writable::Read);
                self.session.deleted = true;
            }
            ClientEvent::Marker(marker) => {
                self.data.markers.insert(marker.id, marker.clone());
            }
            ClientEvent::DeleteMarker(obj) => {
                self.data.markers.remove(&obj.id);
            }
            ClientEvent::Line(line) => {
                let track_points = self.data.lines.remove(&line.id).map(|l| l.track_points).unwrap_or_default();
                self.data.lines.insert(line.id, LineWithTrackPoints { line: line.clone(), track_points });
            }
            ClientEvent::DeleteLine(obj) => {
                self.data.lines.remove(&obj.id);
            }
            ClientEvent::LinePoints(points) => {
                let Some(line) = self.data.lines.get_mut(&points.id) else {
                    tracing::error!(line_id = points.id, "store: received line points for unknown line");
                    return None;
                };
                let base = if points.reset { None } else { Some(&line.track_points) };
                line.track_points = TrackPoints::merge(base, &points.track_points);
            }
            ClientEvent::RoutePoints(points) => {
                let Some(route) = self.data.route.as_mut() else {
                    tracing::error!("store: received route points for unknown route");
                    return None;
                };
                route.track_points = TrackPoints::merge(Some(&route.track_points), points);
            }
            ClientEvent::RoutePointsWithId(points) => {
                let Some(route) = self.data.routes.get_mut(&points.route_id) else {
                    tracing::error!(route_id = %points.route_id, "store: received route points for unknown route");
                    return None;
                };
                route.track_points = TrackPoints::merge(Some(&route.track_points), &points.track_points);
            }
            ClientEvent::View(view) => {
                self.data.views.insert(view.id, view.clone());
            }
            ClientEvent::DeleteView(obj) => {
                self.data.views.remove(&obj.id);
                if let Some(pad) = self.data.pad_data.as_mut() {
                    if pad.default_view_id == Some(obj.id) {
                        pad.default_view_id = None;
                    }
                }
            }
            ClientEvent::Type(ty) => {
                self.data.types.insert(ty.id, ty.clone());
            }
            ClientEvent::DeleteType(obj) => {
                self.data.types.remove(&obj.id);
            }
            ClientEvent::History(entry) => self.push_history(entry.clone()),
            ClientEvent::Disconnect(_) => {
                self.session.disconnected = true;
                self.data.markers.clear();
                self.data.lines.clear();
                self.data.views.clear();
                self.data.history.clear();
            }
            ClientEvent::Connect => {
                self.session.disconnected = false;
                self.bump();
                return Some(self.replay_plan());
            }
            ClientEvent::LoadStart => self.session.loading = self.session.loading.saturating_add(1),
            ClientEvent::LoadEnd => self.session.loading = self.session.loading.saturating_sub(1),
            _ => return None,
        }
        self.bump();
        None
    }

    fn apply_pad_data(&mut self, data: &PadData) {
        if let Some(level) = data.writable {
            self.session.readonly = Some(level == Writable::Read);
            self.session.writable = Some(level);
        }
        let id = match self.session.writable {
            Some(Writable::Admin) => data.admin_id.clone(),
            Some(Writable::Write) => data.write_id.clone(),
            Some(Writable::Read) | None => Some(data.id.clone()),
        };
        if let Some(id) = id {
            self.session.pad_id = Some(id);
        }
        self.data.pad_data = Some(data.clone());
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        self.data.history.insert(entry.id, entry);
        while self.data.history.len() > HISTORY_CAP {
            self.data.history.shift_remove_index(0);
        }
    }

    fn replay_plan(&self) -> ReplayPlan {
        let mut named: Vec<&RouteWithTrackPoints> = self.data.routes.values().collect();
        named.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        ReplayPlan {
            pad_id: self.session.pad_id.clone(),
            bbox: self.session.bbox,
            listen_to_history: self.session.listening_to_history,
            routes: self.data.route.iter().chain(named).map(RouteWithTrackPoints::to_create).collect(),
        }
    }

    // =========================================================================
    // REQUEST CONTINUATIONS
    // =========================================================================

    /// Start attaching to a pad: forget the previous error, remember the id.
    pub(crate) fn begin_pad_attach(&mut self, pad_id: PadId) {
        self.session.server_error = None;
        self.session.pad_id = Some(pad_id);
        self.bump();
    }

    pub(crate) fn set_server_error(&mut self, error: ClientError) {
        self.session.server_error = Some(error);
        self.bump();
    }

    pub(crate) fn set_bbox(&mut self, bbox: BboxWithZoom) {
        self.session.bbox = Some(bbox);
        self.bump();
    }

    /// A freshly created pad is writable by its creator with admin rights.
    pub(crate) fn mark_pad_created(&mut self) {
        self.session.server_error = None;
        self.session.readonly = Some(false);
        self.session.writable = Some(Writable::Admin);
        self.bump();
    }

    pub(crate) fn set_listening_to_history(&mut self, listening: bool) {
        self.session.listening_to_history = listening;
        self.bump();
    }

    pub(crate) fn clear_history(&mut self) {
        self.data.history.clear();
        self.bump();
    }

    pub(crate) fn upsert_marker(&mut self, marker: Marker) {
        self.data.markers.insert(marker.id, marker);
        self.bump();
    }

    pub(crate) fn set_route(&mut self, route: RouteWithTrackPoints) {
        match route.route_id.clone() {
            Some(id) => {
                self.data.routes.insert(id, route);
            }
            None => self.data.route = Some(route),
        }
        self.bump();
    }

    /// Returns whether anything was cleared.
    pub(crate) fn clear_route(&mut self, route_id: Option<&str>) -> bool {
        let cleared = match route_id {
            Some(id) => self.data.routes.remove(id).is_some(),
            None => self.data.route.take().is_some(),
        };
        if cleared {
            self.bump();
        }
        cleared
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
