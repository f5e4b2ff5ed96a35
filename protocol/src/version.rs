//! Protocol versions served by the server.

use std::fmt;
use std::str::FromStr;

/// A wire protocol version. Each one is served at its own `/v{n}` path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Legacy protocol: maps are called pads, icons are called symbols.
    V2,
    /// Current protocol. The internal model always uses this shape.
    #[default]
    V3,
}

impl ProtocolVersion {
    /// Numeric version tag.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Path segment the version is served at, e.g. `/v2`.
    #[must_use]
    pub fn path(self) -> String {
        format!("/v{}", self.number())
    }

    /// Whether payloads need the legacy field renames.
    #[must_use]
    pub fn is_legacy(self) -> bool {
        self == Self::V2
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "v2" => Ok(Self::V2),
            "3" | "v3" => Ok(Self::V3),
            other => Err(format!("unsupported protocol version '{other}' (expected 'v2' or 'v3')")),
        }
    }
}
