//! Realtime FacilMap client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Connects to a FacilMap server over a websocket, optionally attaches to a
//! pad and keeps a local mirror of everything the server pushes for it.
//!
//! ```text
//! ws::WsTransport ──TransportEvent──► client::Client ──ClientEvent──► events::ListenerRegistry
//!                                          │                               │
//!                                          └──── requests ◄────────────────┘
//!                                                                    store::Store
//! ```
//!
//! Protocol version handling (legacy renames, data bags, frames) lives in
//! `facilmap_protocol`; this crate only ever sees current-shape payloads.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod track_points;
pub mod transport;
pub mod ws;

pub use client::Client;
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::{ClientError, ConfigError};
pub use events::{ClientEvent, EventName, ListenerId, ListenerRegistry};
pub use facilmap_protocol::{ProtocolVersion, types};
pub use store::{LineWithTrackPoints, PadSnapshot, RouteWithTrackPoints, SessionState, Store};
pub use track_points::TrackPoints;
pub use transport::{EmitError, ListenerScope, ManagerEvent, Transport, TransportEvent};
pub use ws::WsTransport;
