//! Boundary translation between a wire protocol version and the current shape.
//!
//! SYSTEM CONTEXT
//! ==============
//! The client only ever handles current-shape payloads. Everything that
//! crosses the socket goes through one of the functions here:
//!
//! - outbound requests: [`encode_request`]
//! - replies: [`decode_response`], [`decode_error_name`]
//! - pushes: [`decode_event`]
//! - batch replies: [`decode_envelope`] then [`Envelope::from_value`]
//!
//! The server-side counterparts ([`decode_request`], [`encode_response`],
//! [`encode_event`], [`encode_envelope`]) exist so in-process test servers can
//! speak either version.
//!
//! DESIGN
//! ======
//! Batch envelopes map an event name to an ordered payload list. The frame
//! codec stores objects as sorted maps, so key order does not survive the
//! wire; entries are therefore applied in [`EVENTS`] order, which puts every
//! entity before the events that reference it. Payload order inside one
//! entry is kept.

use serde_json::{Map, Value};

use crate::ProtocolError;
use crate::legacy::{self, RenameMode};
use crate::names::{EVENTS, PushEvent, RequestName};
use crate::safe_map::normalize_data_bag;
use crate::version::ProtocolVersion;

// =============================================================================
// CLIENT SIDE
// =============================================================================

/// Wire name and payload for an outbound request.
#[must_use]
pub fn encode_request(version: ProtocolVersion, name: RequestName, payload: Value) -> (&'static str, Value) {
    let payload = if version.is_legacy() { name.spec().payload.to_legacy(payload, RenameMode::Replace) } else { payload };
    (name.wire_name(version), payload)
}

/// Turn a reply into the current shape. Data bags of marker and line replies
/// are rebuilt as clean maps; envelopes come back with canonical keys.
#[must_use]
pub fn decode_response(version: ProtocolVersion, name: RequestName, payload: Value) -> Value {
    let spec = name.spec();
    if spec.response == legacy::Shape::Envelope {
        return decode_envelope(version, payload);
    }
    let payload = if version.is_legacy() { spec.response.to_current(payload, RenameMode::Replace) } else { payload };
    if spec.data_bag { normalize_data_bag(payload) } else { payload }
}

/// Translate the error class name of a rejected request.
#[must_use]
pub fn decode_error_name(version: ProtocolVersion, name: &str) -> String {
    if version.is_legacy() { legacy::legacy_error_name_to_current(name).to_owned() } else { name.to_owned() }
}

/// Resolve a pushed event and turn its payload into the current shape.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownEvent`] if the name is not a push event of
/// this protocol version.
pub fn decode_event(version: ProtocolVersion, wire: &str, payload: Value) -> Result<(PushEvent, Value), ProtocolError> {
    let event = PushEvent::from_wire(version, wire).ok_or_else(|| ProtocolError::UnknownEvent(wire.to_owned()))?;
    Ok((event, decode_event_payload(version, event, payload)))
}

fn decode_event_payload(version: ProtocolVersion, event: PushEvent, payload: Value) -> Value {
    let spec = event.spec();
    let payload = if version.is_legacy() { spec.payload.to_current(payload, RenameMode::Replace) } else { payload };
    if spec.data_bag { normalize_data_bag(payload) } else { payload }
}

/// Rename the keys and payloads of a batch envelope into the current shape.
/// Keys that are not push events of this version are kept untouched.
#[must_use]
pub fn decode_envelope(version: ProtocolVersion, envelope: Value) -> Value {
    let Value::Object(entries) = envelope else {
        return envelope;
    };
    let mut out = Map::new();
    for (key, payloads) in entries {
        match PushEvent::from_wire(version, &key) {
            Some(event) => {
                let payloads = map_items(payloads, |p| decode_event_payload(version, event, p));
                out.insert(event.canonical_name().to_owned(), payloads);
            }
            None => {
                out.insert(key, payloads);
            }
        }
    }
    Value::Object(out)
}

/// A decoded batch envelope, split into per-event payload lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    /// Entries in application order.
    pub entries: Vec<(PushEvent, Vec<Value>)>,
    /// Keys that did not name a push event.
    pub unknown: Vec<String>,
}

impl Envelope {
    /// Split a canonical-keyed envelope. A non-object value gives an empty
    /// envelope; a non-array entry counts as a single payload.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut entries) = value else {
            return Self::default();
        };
        let mut out = Self::default();
        for spec in &EVENTS {
            let Some(payloads) = entries.remove(spec.v3) else {
                continue;
            };
            let payloads = match payloads {
                Value::Array(items) => items,
                Value::Null => continue,
                single => vec![single],
            };
            out.entries.push((spec.name, payloads));
        }
        out.unknown = entries.into_iter().map(|(key, _)| key).collect();
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every payload, flattened in application order.
    pub fn iter(&self) -> impl Iterator<Item = (PushEvent, &Value)> {
        self.entries.iter().flat_map(|(event, payloads)| payloads.iter().map(move |p| (*event, p)))
    }
}

// =============================================================================
// SERVER SIDE
// =============================================================================

/// Resolve an inbound request and turn its payload into the current shape.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownRequest`] if the name is not a request of
/// this protocol version.
pub fn decode_request(version: ProtocolVersion, wire: &str, payload: Value) -> Result<(RequestName, Value), ProtocolError> {
    let name = RequestName::from_wire(version, wire).ok_or_else(|| ProtocolError::UnknownRequest(wire.to_owned()))?;
    let payload = if version.is_legacy() { name.spec().payload.to_current(payload, RenameMode::Replace) } else { payload };
    Ok((name, payload))
}

/// Turn a current-shape reply into what a client of `version` expects.
#[must_use]
pub fn encode_response(version: ProtocolVersion, name: RequestName, payload: Value) -> Value {
    let spec = name.spec();
    if spec.response == legacy::Shape::Envelope {
        return encode_envelope(version, payload);
    }
    if version.is_legacy() { spec.response.to_legacy(payload, RenameMode::Replace) } else { payload }
}

/// Wire name and payload for a push to a client of `version`.
#[must_use]
pub fn encode_event(version: ProtocolVersion, event: PushEvent, payload: Value) -> (&'static str, Value) {
    let payload = if version.is_legacy() { event.spec().payload.to_legacy(payload, RenameMode::Replace) } else { payload };
    (event.wire_name(version), payload)
}

/// Rename a canonical envelope into the keys and shapes of `version`.
#[must_use]
pub fn encode_envelope(version: ProtocolVersion, envelope: Value) -> Value {
    let Value::Object(entries) = envelope else {
        return envelope;
    };
    let mut out = Map::new();
    for (key, payloads) in entries {
        match PushEvent::from_canonical(&key) {
            Some(event) => {
                let payloads = map_items(payloads, |p| encode_event(version, event, p).1);
                out.insert(event.wire_name(version).to_owned(), payloads);
            }
            None => {
                out.insert(key, payloads);
            }
        }
    }
    Value::Object(out)
}

fn map_items(value: Value, f: impl Fn(Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(f).collect()),
        other => other,
    }
}

#[cfg(test)]
#[path = "translate_test.rs"]
mod tests;
