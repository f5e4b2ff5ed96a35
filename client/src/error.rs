//! Error types of the realtime client.
//!
//! [`ClientError`] is `Clone` so one failure can be stored as the session's
//! `server_error`, carried by `emitReject`/`serverError` events and returned
//! to the caller at the same time.

use crate::transport::EmitError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The connection is gone or the request could not be delivered.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server rejected the request.
    #[error("{message}")]
    Request {
        /// Error class reported by the server, in current naming.
        name: Option<String>,
        message: String,
    },
    /// A payload did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// One session attaches to one pad.
    #[error("Pad ID already set.")]
    PadIdAlreadySet,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Error class name of a server rejection, if any.
    #[must_use]
    pub fn server_error_name(&self) -> Option<&str> {
        match self {
            Self::Request { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn from_emit(version: facilmap_protocol::ProtocolVersion, error: EmitError) -> Self {
        match error {
            EmitError::Remote { name, message } => Self::Request {
                name: name.map(|name| facilmap_protocol::decode_error_name(version, &name)),
                message,
            },
            EmitError::Transport(message) => Self::Transport(message),
        }
    }
}

impl From<facilmap_protocol::ProtocolError> for ClientError {
    fn from(error: facilmap_protocol::ProtocolError) -> Self {
        Self::Protocol(error.to_string())
    }
}

/// Invalid or missing client configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
    #[error("invalid server URL '{0}' (expected http, https, ws or wss)")]
    InvalidServer(String),
}
