//! Errors raised while decoding or translating wire payloads.

/// Error returned by the frame codec and the version translation layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known status.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
    /// An inbound event name is not part of the negotiated protocol version.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    /// A request name is not part of the negotiated protocol version.
    #[error("unknown request `{0}`")]
    UnknownRequest(String),
    /// A payload did not have the shape its request or event requires.
    #[error("invalid payload for `{name}`: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
