//! Wire protocol shared by the FacilMap realtime client and its test servers.
//!
//! SYSTEM CONTEXT
//! ==============
//! This crate owns everything that depends on the protocol version:
//!
//! - the binary frame codec used on the websocket ([`frame`])
//! - request and push-event tables per version ([`names`])
//! - field renames between the legacy and current shape ([`legacy`])
//! - clean maps for free-form data bags ([`safe_map`])
//! - the boundary functions that combine the above ([`translate`])
//! - typed current-shape payloads ([`types`])
//!
//! Nothing here performs I/O.

pub mod error;
pub mod frame;
pub mod legacy;
pub mod names;
pub mod safe_map;
pub mod translate;
pub mod types;
pub mod version;

pub use error::ProtocolError;
pub use frame::{Frame, Status, decode_frame, encode_frame};
pub use legacy::{RenameMode, Shape};
pub use names::{EVENTS, EventSpec, PushEvent, REQUESTS, RequestName, RequestSpec};
pub use safe_map::{SafeMap, normalize_data_bag};
pub use translate::{
    Envelope, decode_envelope, decode_error_name, decode_event, decode_request, decode_response, encode_envelope,
    encode_event, encode_request, encode_response,
};
pub use version::ProtocolVersion;
