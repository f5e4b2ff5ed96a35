//! Client configuration, built in code or parsed from environment variables.

use std::time::Duration;

use facilmap_protocol::ProtocolVersion;

use crate::error::ConfigError;

pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;

/// Exponential reconnect backoff owned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_ms: u64,
    pub max_ms: u64,
    /// Give up and report `reconnect_failed` after this many attempts.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { initial_ms: DEFAULT_RECONNECT_INITIAL_MS, max_ms: DEFAULT_RECONNECT_MAX_MS, max_attempts: None }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based): the initial delay,
    /// doubled per attempt and capped at the maximum.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let delay = self.initial_ms.saturating_mul(1_u64 << shift).min(self.max_ms);
        Duration::from_millis(delay)
    }

    /// Whether another attempt is allowed after `attempt` attempts failed.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the FacilMap server, e.g. `https://facilmap.org/`.
    pub server: String,
    /// Pad to attach to as soon as the connection is up.
    pub pad_id: Option<String>,
    pub protocol: ProtocolVersion,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self { server: server.into(), pad_id: None, protocol: ProtocolVersion::default(), reconnect: ReconnectPolicy::default() }
    }

    #[must_use]
    pub fn with_pad_id(mut self, pad_id: impl Into<String>) -> Self {
        self.pad_id = Some(pad_id.into());
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `FACILMAP_SERVER`
    ///
    /// Optional:
    /// - `FACILMAP_PAD_ID`
    /// - `FACILMAP_PROTOCOL`: `v3` (default) or `v2`
    /// - `FACILMAP_RECONNECT_INITIAL_MS`: default 1000
    /// - `FACILMAP_RECONNECT_MAX_MS`: default 10000
    /// - `FACILMAP_RECONNECT_ATTEMPTS`: unlimited when absent
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the server is missing or the protocol
    /// version is not recognized.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server = lookup("FACILMAP_SERVER")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing { var: "FACILMAP_SERVER" })?;
        let pad_id = lookup("FACILMAP_PAD_ID").filter(|s| !s.is_empty());
        let protocol = match lookup("FACILMAP_PROTOCOL") {
            Some(raw) => raw
                .parse::<ProtocolVersion>()
                .map_err(|message| ConfigError::Invalid { var: "FACILMAP_PROTOCOL", message })?,
            None => ProtocolVersion::default(),
        };
        let reconnect = ReconnectPolicy {
            initial_ms: parse_or(&lookup, "FACILMAP_RECONNECT_INITIAL_MS", DEFAULT_RECONNECT_INITIAL_MS),
            max_ms: parse_or(&lookup, "FACILMAP_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS),
            max_attempts: lookup("FACILMAP_RECONNECT_ATTEMPTS").and_then(|v| v.parse::<u32>().ok()),
        };

        Ok(Self { server, pad_id, protocol, reconnect })
    }

    /// Websocket URL of the configured protocol version:
    /// `{ws-origin}{server-path}/socket.io/v{n}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidServer`] for unsupported schemes.
    pub fn socket_url(&self) -> Result<String, ConfigError> {
        socket_url(&self.server, self.protocol)
    }
}

pub(crate) fn socket_url(server: &str, protocol: ProtocolVersion) -> Result<String, ConfigError> {
    let trimmed = server.trim();
    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = trimmed.strip_prefix("wss://") {
        ("wss", rest)
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        ("ws", rest)
    } else {
        return Err(ConfigError::InvalidServer(server.to_owned()));
    };

    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (host, path) = rest.split_once('/').map_or((rest, ""), |(host, path)| (host, path));
    if host.is_empty() {
        return Err(ConfigError::InvalidServer(server.to_owned()));
    }
    let path = path.trim_end_matches('/');
    let path = if path.is_empty() { String::new() } else { format!("/{path}") };

    Ok(format!("{scheme}://{host}{path}/socket.io{}", protocol.path()))
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
