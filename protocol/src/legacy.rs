//! Field renames between the legacy v2 protocol and the current shape.
//!
//! SYSTEM CONTEXT
//! ==============
//! v2 calls maps "pads" and icons "symbols". The internal model always uses
//! the current names; these functions rewrite key names at the boundary and
//! never touch values. Each transform only looks at the value it is given.
//!
//! | shape        | legacy                          | current                        |
//! |--------------|---------------------------------|--------------------------------|
//! | marker       | `symbol`, `padId`               | `icon`, `mapId`                |
//! | line/view    | `padId`                         | `mapId`                        |
//! | history      | `padId`                         | `mapId`                        |
//! | type         | `defaultSymbol`, `symbolFixed`  | `defaultIcon`, `iconFixed`     |
//! | type.fields  | `controlSymbol`                 | `controlIcon`                  |
//! | .options     | `symbol`                        | `icon`                         |
//! | get-pad query| `padId`                         | `mapId`                        |

use serde_json::Value;

/// Whether a rename drops the old key or keeps both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenameMode {
    /// Move the value to the new key.
    #[default]
    Replace,
    /// Copy the value to the new key and keep the old one as well.
    KeepBoth,
}

/// Payload shapes that need renames. Anything else is [`Shape::Plain`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Plain,
    Marker,
    Line,
    View,
    Type,
    HistoryEntry,
    GetPadQuery,
    FindOnMapResults,
    /// Batch of events keyed by event name; handled by the translate layer.
    Envelope,
}

impl Shape {
    /// Rewrite a legacy payload of this shape into the current shape.
    #[must_use]
    pub fn to_current(self, value: Value, mode: RenameMode) -> Value {
        match self {
            Self::Plain | Self::Envelope => value,
            Self::Marker => legacy_marker_to_current(value, mode),
            Self::Line | Self::View | Self::HistoryEntry | Self::GetPadQuery => {
                rename_property(value, "padId", "mapId", mode)
            }
            Self::Type => legacy_type_to_current(value, mode),
            Self::FindOnMapResults => map_marker_results(value, |v| rename_property(v, "symbol", "icon", mode)),
        }
    }

    /// Rewrite a current payload of this shape into the legacy shape.
    #[must_use]
    pub fn to_legacy(self, value: Value, mode: RenameMode) -> Value {
        match self {
            Self::Plain | Self::Envelope => value,
            Self::Marker => current_marker_to_legacy(value, mode),
            Self::Line | Self::View | Self::HistoryEntry | Self::GetPadQuery => {
                rename_property(value, "mapId", "padId", mode)
            }
            Self::Type => current_type_to_legacy(value, mode),
            Self::FindOnMapResults => map_marker_results(value, |v| rename_property(v, "icon", "symbol", mode)),
        }
    }
}

/// Rename one key of an object. Non-objects and objects without `from` pass
/// through unchanged.
#[must_use]
pub fn rename_property(value: Value, from: &str, to: &str, mode: RenameMode) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    let moved = match mode {
        RenameMode::Replace => map.remove(from),
        RenameMode::KeepBoth => map.get(from).cloned(),
    };
    if let Some(v) = moved {
        map.insert(to.to_owned(), v);
    }
    Value::Object(map)
}

#[must_use]
pub fn legacy_marker_to_current(marker: Value, mode: RenameMode) -> Value {
    let marker = rename_property(marker, "symbol", "icon", mode);
    rename_property(marker, "padId", "mapId", mode)
}

#[must_use]
pub fn current_marker_to_legacy(marker: Value, mode: RenameMode) -> Value {
    let marker = rename_property(marker, "icon", "symbol", mode);
    rename_property(marker, "mapId", "padId", mode)
}

#[must_use]
pub fn legacy_type_to_current(ty: Value, mode: RenameMode) -> Value {
    let ty = rename_property(ty, "defaultSymbol", "defaultIcon", mode);
    let ty = rename_property(ty, "symbolFixed", "iconFixed", mode);
    let ty = rename_property(ty, "padId", "mapId", mode);
    map_array_at(ty, "fields", |field| {
        let field = rename_property(field, "controlSymbol", "controlIcon", mode);
        map_array_at(field, "options", |option| rename_property(option, "symbol", "icon", mode))
    })
}

#[must_use]
pub fn current_type_to_legacy(ty: Value, mode: RenameMode) -> Value {
    let ty = rename_property(ty, "defaultIcon", "defaultSymbol", mode);
    let ty = rename_property(ty, "iconFixed", "symbolFixed", mode);
    let ty = rename_property(ty, "mapId", "padId", mode);
    map_array_at(ty, "fields", |field| {
        let field = rename_property(field, "controlIcon", "controlSymbol", mode);
        map_array_at(field, "options", |option| rename_property(option, "icon", "symbol", mode))
    })
}

/// Translate an error class name reported by a v2 server.
#[must_use]
pub fn legacy_error_name_to_current(name: &str) -> &str {
    match name {
        "PadNotFoundError" => "MapNotFoundError",
        other => other,
    }
}

/// Translate an error class name into what a v2 client expects.
#[must_use]
pub fn current_error_name_to_legacy(name: &str) -> &str {
    match name {
        "MapNotFoundError" => "PadNotFoundError",
        other => other,
    }
}

/// Apply `f` to every element of the array stored at `key`, if there is one.
fn map_array_at(value: Value, key: &str, f: impl Fn(Value) -> Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    if let Some(Value::Array(items)) = map.get_mut(key) {
        *items = std::mem::take(items).into_iter().map(f).collect();
    }
    Value::Object(map)
}

/// Apply `f` to the marker entries of a find-on-map result list.
fn map_marker_results(value: Value, f: impl Fn(Value) -> Value) -> Value {
    let Value::Array(items) = value else {
        return value;
    };
    Value::Array(
        items
            .into_iter()
            .map(|item| if item.get("kind").and_then(Value::as_str) == Some("marker") { f(item) } else { item })
            .collect(),
    )
}

#[cfg(test)]
#[path = "legacy_test.rs"]
mod tests;
