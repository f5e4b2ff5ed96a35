//! Request and push-event tables.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each request and each server push has one canonical variant here. The
//! tables map a variant to its wire name per protocol version and to the
//! payload shapes the legacy translation has to rewrite. Wire names only
//! differ where v3 renamed "pad" to "map".

use std::fmt;

use crate::legacy::Shape;
use crate::version::ProtocolVersion;

// =============================================================================
// REQUESTS
// =============================================================================

/// Every request the client can send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestName {
    GetPad,
    FindPads,
    CreatePad,
    EditPad,
    DeletePad,
    ListenToHistory,
    StopListeningToHistory,
    RevertHistoryEntry,
    GetMarker,
    AddMarker,
    EditMarker,
    DeleteMarker,
    GetLineTemplate,
    AddLine,
    EditLine,
    DeleteLine,
    ExportLine,
    Find,
    FindOnMap,
    GetRoute,
    SetRoute,
    ClearRoute,
    LineToRoute,
    ExportRoute,
    AddType,
    EditType,
    DeleteType,
    AddView,
    EditView,
    DeleteView,
    Geoip,
    UpdateBbox,
    SetPadId,
}

/// Wire names and payload shapes of one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestSpec {
    pub name: RequestName,
    pub v2: &'static str,
    pub v3: &'static str,
    /// Shape of the outbound payload.
    pub payload: Shape,
    /// Shape of the reply payload.
    pub response: Shape,
    /// Reply carries a free-form `data` bag that must be rebuilt as a clean map.
    pub data_bag: bool,
}

const fn req(
    name: RequestName,
    v2: &'static str,
    v3: &'static str,
    payload: Shape,
    response: Shape,
    data_bag: bool,
) -> RequestSpec {
    RequestSpec { name, v2, v3, payload, response, data_bag }
}

/// Request table, in [`RequestName`] declaration order.
pub const REQUESTS: [RequestSpec; 33] = {
    use RequestName as R;
    use Shape as S;
    [
        req(R::GetPad, "getPad", "getMap", S::GetPadQuery, S::Plain, false),
        req(R::FindPads, "findPads", "findMaps", S::Plain, S::Plain, false),
        req(R::CreatePad, "createPad", "createMap", S::Plain, S::Envelope, false),
        req(R::EditPad, "editPad", "editMap", S::Plain, S::Plain, false),
        req(R::DeletePad, "deletePad", "deleteMap", S::Plain, S::Plain, false),
        req(R::ListenToHistory, "listenToHistory", "listenToHistory", S::Plain, S::Envelope, false),
        req(R::StopListeningToHistory, "stopListeningToHistory", "stopListeningToHistory", S::Plain, S::Plain, false),
        req(R::RevertHistoryEntry, "revertHistoryEntry", "revertHistoryEntry", S::Plain, S::Envelope, false),
        req(R::GetMarker, "getMarker", "getMarker", S::Plain, S::Marker, true),
        req(R::AddMarker, "addMarker", "addMarker", S::Marker, S::Marker, true),
        req(R::EditMarker, "editMarker", "editMarker", S::Marker, S::Marker, true),
        req(R::DeleteMarker, "deleteMarker", "deleteMarker", S::Plain, S::Marker, true),
        req(R::GetLineTemplate, "getLineTemplate", "getLineTemplate", S::Plain, S::Line, true),
        req(R::AddLine, "addLine", "addLine", S::Line, S::Line, true),
        req(R::EditLine, "editLine", "editLine", S::Line, S::Line, true),
        req(R::DeleteLine, "deleteLine", "deleteLine", S::Plain, S::Line, true),
        req(R::ExportLine, "exportLine", "exportLine", S::Plain, S::Plain, false),
        req(R::Find, "find", "find", S::Plain, S::Plain, false),
        req(R::FindOnMap, "findOnMap", "findOnMap", S::Plain, S::FindOnMapResults, false),
        req(R::GetRoute, "getRoute", "getRoute", S::Plain, S::Plain, false),
        req(R::SetRoute, "setRoute", "setRoute", S::Plain, S::Plain, false),
        req(R::ClearRoute, "clearRoute", "clearRoute", S::Plain, S::Plain, false),
        req(R::LineToRoute, "lineToRoute", "lineToRoute", S::Plain, S::Plain, false),
        req(R::ExportRoute, "exportRoute", "exportRoute", S::Plain, S::Plain, false),
        req(R::AddType, "addType", "addType", S::Type, S::Type, false),
        req(R::EditType, "editType", "editType", S::Type, S::Type, false),
        req(R::DeleteType, "deleteType", "deleteType", S::Plain, S::Type, false),
        req(R::AddView, "addView", "addView", S::View, S::View, false),
        req(R::EditView, "editView", "editView", S::View, S::View, false),
        req(R::DeleteView, "deleteView", "deleteView", S::Plain, S::View, false),
        req(R::Geoip, "geoip", "geoip", S::Plain, S::Plain, false),
        req(R::UpdateBbox, "updateBbox", "updateBbox", S::Plain, S::Envelope, false),
        req(R::SetPadId, "setPadId", "setMapId", S::Plain, S::Envelope, false),
    ]
};

impl RequestName {
    /// Table entry for this request.
    #[must_use]
    pub fn spec(self) -> &'static RequestSpec {
        &REQUESTS[self as usize]
    }

    /// Wire name used by the given protocol version.
    #[must_use]
    pub fn wire_name(self, version: ProtocolVersion) -> &'static str {
        let spec = self.spec();
        match version {
            ProtocolVersion::V2 => spec.v2,
            ProtocolVersion::V3 => spec.v3,
        }
    }

    /// Look a request up by its wire name in the given protocol version.
    #[must_use]
    pub fn from_wire(version: ProtocolVersion, wire: &str) -> Option<Self> {
        REQUESTS
            .iter()
            .find(|spec| match version {
                ProtocolVersion::V2 => spec.v2 == wire,
                ProtocolVersion::V3 => spec.v3 == wire,
            })
            .map(|spec| spec.name)
    }
}

impl fmt::Display for RequestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().v2)
    }
}

// =============================================================================
// PUSH EVENTS
// =============================================================================

/// Every event the server pushes for an attached pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushEvent {
    PadData,
    DeletePad,
    View,
    DeleteView,
    Type,
    DeleteType,
    Marker,
    DeleteMarker,
    Line,
    DeleteLine,
    LinePoints,
    RoutePoints,
    RoutePointsWithId,
    History,
}

/// Wire names and payload shape of one push event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSpec {
    pub name: PushEvent,
    pub v2: &'static str,
    pub v3: &'static str,
    pub payload: Shape,
    /// Payload carries a free-form `data` bag that must be rebuilt as a clean map.
    pub data_bag: bool,
}

const fn ev(name: PushEvent, v2: &'static str, v3: &'static str, payload: Shape, data_bag: bool) -> EventSpec {
    EventSpec { name, v2, v3, payload, data_bag }
}

/// Event table. Declaration order is also the order batch envelopes are
/// applied in: entities referenced by later events come first.
pub const EVENTS: [EventSpec; 14] = {
    use PushEvent as E;
    use Shape as S;
    [
        ev(E::PadData, "padData", "mapData", S::Plain, false),
        ev(E::DeletePad, "deletePad", "deleteMap", S::Plain, false),
        ev(E::View, "view", "view", S::View, false),
        ev(E::DeleteView, "deleteView", "deleteView", S::Plain, false),
        ev(E::Type, "type", "type", S::Type, false),
        ev(E::DeleteType, "deleteType", "deleteType", S::Plain, false),
        ev(E::Marker, "marker", "marker", S::Marker, true),
        ev(E::DeleteMarker, "deleteMarker", "deleteMarker", S::Plain, false),
        ev(E::Line, "line", "line", S::Line, true),
        ev(E::DeleteLine, "deleteLine", "deleteLine", S::Plain, false),
        ev(E::LinePoints, "linePoints", "linePoints", S::Plain, false),
        ev(E::RoutePoints, "routePoints", "routePoints", S::Plain, false),
        ev(E::RoutePointsWithId, "routePointsWithId", "routePointsWithId", S::Plain, false),
        ev(E::History, "history", "history", S::HistoryEntry, false),
    ]
};

impl PushEvent {
    /// Table entry for this event.
    #[must_use]
    pub fn spec(self) -> &'static EventSpec {
        &EVENTS[self as usize]
    }

    /// Wire name used by the given protocol version.
    #[must_use]
    pub fn wire_name(self, version: ProtocolVersion) -> &'static str {
        let spec = self.spec();
        match version {
            ProtocolVersion::V2 => spec.v2,
            ProtocolVersion::V3 => spec.v3,
        }
    }

    /// Name used for this event inside decoded batch envelopes.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        self.spec().v3
    }

    /// Look an event up by its wire name in the given protocol version.
    #[must_use]
    pub fn from_wire(version: ProtocolVersion, wire: &str) -> Option<Self> {
        EVENTS
            .iter()
            .find(|spec| match version {
                ProtocolVersion::V2 => spec.v2 == wire,
                ProtocolVersion::V3 => spec.v3 == wire,
            })
            .map(|spec| spec.name)
    }

    /// Look an event up by its canonical envelope name.
    #[must_use]
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::from_wire(ProtocolVersion::V3, name)
    }
}

impl fmt::Display for PushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().v2)
    }
}

#[cfg(test)]
#[path = "names_test.rs"]
mod tests;
