//! Binary frame model and protobuf codec for the realtime websocket.
//!
//! Every message on the socket is one [`Frame`]. Requests carry a fresh id,
//! replies point back at it through `parent_id`, and server pushes use the
//! [`Status::Event`] status with the wire event name. Payloads stay flexible
//! (`serde_json::Value`) and travel as `google.protobuf.Value`.

use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message;
use prost_types::value::Kind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::ProtocolError;

/// Largest integer a JSON number can carry without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Lifecycle status of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Outbound request sent by the client.
    Request,
    /// Server push not tied to any request.
    Event,
    /// Successful reply to a request.
    Done,
    /// Failed reply to a request.
    Error,
}

impl Status {
    /// Protobuf enum value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Request => WireFrameStatus::Request as i32,
            Self::Event => WireFrameStatus::Event as i32,
            Self::Done => WireFrameStatus::Done as i32,
            Self::Error => WireFrameStatus::Error as i32,
        }
    }

    /// Replies end a request/response exchange.
    #[must_use]
    pub fn is_reply(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    fn from_i32(value: i32) -> Result<Self, ProtocolError> {
        match WireFrameStatus::try_from(value) {
            Ok(WireFrameStatus::Request) => Ok(Self::Request),
            Ok(WireFrameStatus::Event) => Ok(Self::Event),
            Ok(WireFrameStatus::Done) => Ok(Self::Done),
            Ok(WireFrameStatus::Error) => Ok(Self::Error),
            Err(_) => Err(ProtocolError::InvalidStatus(value)),
        }
    }
}

/// One websocket message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// UUID v4 string.
    pub id: String,
    /// ID of the request frame this is replying to, if any.
    pub parent_id: Option<String>,
    /// Creation time, ms since the Unix epoch.
    pub ts: i64,
    /// Wire request or event name, already translated for the protocol version.
    pub name: String,
    pub status: Status,
    /// Request arguments, reply value or push payload.
    pub data: Value,
}

impl Frame {
    /// Build a request frame with a fresh id.
    pub fn request(name: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            ts: now_ms(),
            name: name.into(),
            status: Status::Request,
            data,
        }
    }

    /// Build a server push frame.
    pub fn event(name: impl Into<String>, data: Value) -> Self {
        Self { status: Status::Event, ..Self::request(name, data) }
    }

    /// Build a successful reply to this request.
    #[must_use]
    pub fn done(&self, data: Value) -> Self {
        self.reply(Status::Done, data)
    }

    /// Build an error reply to this request.
    #[must_use]
    pub fn error(&self, name: Option<&str>, message: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("message".to_owned(), Value::String(message.into()));
        if let Some(name) = name {
            data.insert("name".to_owned(), Value::String(name.to_owned()));
        }
        self.reply(Status::Error, Value::Object(data))
    }

    fn reply(&self, status: Status, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: Some(self.id.clone()),
            ts: now_ms(),
            name: self.name.clone(),
            status,
            data,
        }
    }
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

/// Serialize a frame for the socket.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of buffer space.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] for malformed bytes and
/// [`ProtocolError::InvalidStatus`] for out-of-range status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, ProtocolError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        name: frame.name.clone(),
        status: frame.status.as_i32(),
        data: Some(json_to_proto_value(&frame.data)),
    }
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, ProtocolError> {
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        name: wire.name,
        status: Status::from_i32(wire.status)?,
        data: wire.data.map_or(Value::Null, |v| proto_to_json_value(&v)),
    })
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue.into()),
        Value::Bool(flag) => Kind::BoolValue(*flag),
        Value::Number(number) => Kind::NumberValue(number.as_f64().unwrap_or_default()),
        Value::String(text) => Kind::StringValue(text.clone()),
        Value::Array(items) => {
            Kind::ListValue(prost_types::ListValue { values: items.iter().map(json_to_proto_value).collect() })
        }
        Value::Object(entries) => Kind::StructValue(prost_types::Struct {
            fields: entries.iter().map(|(key, item)| (key.clone(), json_to_proto_value(item))).collect(),
        }),
    };
    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::NumberValue(number)) => number_to_json(*number),
        Some(Kind::StringValue(text)) => Value::String(text.clone()),
        Some(Kind::BoolValue(flag)) => Value::Bool(*flag),
        Some(Kind::StructValue(entries)) => Value::Object(
            entries.fields.iter().map(|(key, item)| (key.clone(), proto_to_json_value(item))).collect(),
        ),
        Some(Kind::ListValue(items)) => Value::Array(items.values.iter().map(proto_to_json_value).collect()),
    }
}

/// Integral numbers come back as JSON integers so ids and indexes keep their
/// integer type; everything else stays a float.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number_to_json(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        return Value::Number((v as i64).into());
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, tag = "4")]
    name: String,
    #[prost(enumeration = "WireFrameStatus", tag = "5")]
    status: i32,
    #[prost(message, optional, tag = "6")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireFrameStatus {
    Request = 0,
    Done = 1,
    Error = 2,
    Event = 3,
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
