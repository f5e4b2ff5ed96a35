//! Typed payloads of the current protocol shape.
//!
//! SYSTEM CONTEXT
//! ==============
//! These structs mirror what a v3 server sends and accepts. Legacy payloads
//! are renamed into this shape before they are deserialized, so nothing
//! outside the translation layer ever sees a v2 field name.
//!
//! Read structs default missing optional fields so that partial payloads
//! (e.g. a line template) still deserialize. Create/update structs skip
//! unset fields when serialized so the server applies its own defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::safe_map::SafeMap;

/// Numeric identifier of a marker, line, view, type or history entry.
pub type Id = u64;

/// Read, write or admin identifier of a pad.
pub type PadId = String;

// =============================================================================
// GEOMETRY
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BboxWithZoom {
    #[serde(flatten)]
    pub bbox: Bbox,
    pub zoom: u32,
    /// Area the client already has data for; the server skips it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<Bbox>,
}

/// One point of a line or route geometry, addressed by its index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub zoom: u32,
    pub idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

// =============================================================================
// PAD
// =============================================================================

/// Access tier of an attached pad. Encoded as `0`, `1`, `2` on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Writable {
    #[default]
    Read,
    Write,
    Admin,
}

impl TryFrom<u8> for Writable {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Read),
            1 => Ok(Self::Write),
            2 => Ok(Self::Admin),
            other => Err(format!("invalid writable level: {other}")),
        }
    }
}

impl From<Writable> for u8 {
    fn from(value: Writable) -> Self {
        match value {
            Writable::Read => 0,
            Writable::Write => 1,
            Writable::Admin => 2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PadData {
    pub id: PadId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_id: Option<PadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<PadId>,
    pub name: String,
    pub search_engines: bool,
    pub description: String,
    pub cluster_markers: bool,
    pub legend1: String,
    pub legend2: String,
    pub default_view_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_view: Option<View>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<Writable>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PadCreate {
    pub id: PadId,
    pub write_id: PadId,
    pub admin_id: PadId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_engines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_markers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend2: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_id: Option<PadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<PadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_engines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_markers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend2: Option<String>,
    /// `Some(None)` clears the default view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_view_id: Option<Option<Id>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPadQuery {
    pub map_id: PadId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPadsQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindPadsResult {
    pub id: PadId,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResults<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub total_length: u64,
}

// =============================================================================
// MARKERS AND LINES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<PadId>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub colour: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
    pub type_id: Id,
    #[serde(default)]
    pub data: SafeMap,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerCreate {
    pub lat: f64,
    pub lon: f64,
    pub type_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SafeMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerUpdate {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SafeMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<PadId>,
    #[serde(default)]
    pub route_points: Vec<Point>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub colour: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub stroke: String,
    #[serde(default)]
    pub name: String,
    pub type_id: Id,
    #[serde(default)]
    pub data: SafeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<Value>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descent: Option<f64>,
    #[serde(flatten, default)]
    pub bbox: Bbox,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCreate {
    pub route_points: Vec<Point>,
    pub type_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SafeMap>,
    /// Points of an already calculated route; the server skips routing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_points: Option<Vec<TrackPoint>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUpdate {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SafeMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTemplateRequest {
    pub type_id: Id,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineExportRequest {
    pub id: Id,
    pub format: ExportFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Gpx,
    GpxTrk,
    GpxRte,
    Geojson,
}

// =============================================================================
// VIEWS AND TYPES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<PadId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_layer: String,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(flatten, default)]
    pub bbox: Bbox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCreate {
    pub name: String,
    pub base_layer: String,
    pub layers: Vec<String>,
    #[serde(flatten)]
    pub bbox: Bbox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewUpdate {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Which kind of object a type applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Marker,
    Line,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Input,
    Textarea,
    Dropdown,
    Checkbox,
}

/// Style settings shared by a type and its field options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOption {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_colour: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_icon: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_shape: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_width: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_stroke: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

/// Defaults and fixed flags of a type. Shared by read, create and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_in_legend: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<PadId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub style: TypeStyle,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub style: TypeStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeUpdate {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub style: TypeStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryObjectType {
    #[default]
    Marker,
    Line,
    View,
    Type,
    #[serde(alias = "Map")]
    Pad,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    #[default]
    Create,
    Update,
    Delete,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Id,
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type")]
    pub object_type: HistoryObjectType,
    pub action: HistoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<PadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_after: Option<Value>,
}

// =============================================================================
// ROUTES
// =============================================================================

/// Everything about a calculated route except its track points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    #[serde(default)]
    pub route_points: Vec<Point>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<Value>,
    #[serde(flatten, default)]
    pub bbox: Bbox,
}

/// A route as returned by `setRoute` and `lineToRoute`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(flatten)]
    pub info: RouteInfo,
    #[serde(default)]
    pub track_points: Vec<TrackPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub destinations: Vec<Point>,
    pub mode: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCreate {
    pub route_points: Vec<Point>,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteClear {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineToRouteCreate {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteExportRequest {
    pub format: ExportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_urls: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOnMapQuery {
    pub query: String,
}

// =============================================================================
// EVENT PAYLOADS
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectWithId {
    pub id: Id,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePoints {
    pub id: Id,
    /// Drop the points known so far before merging these.
    #[serde(default)]
    pub reset: bool,
    pub track_points: Vec<TrackPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePointsWithId {
    pub route_id: String,
    pub track_points: Vec<TrackPoint>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
