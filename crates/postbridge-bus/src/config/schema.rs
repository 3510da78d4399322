use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use postbridge_core::error::{BridgeError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub bus: BusConfig,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BridgeError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.host.listen.trim().is_empty() {
            return Err(BridgeError::BadConfig("host.listen must not be empty".into()));
        }
        if !(self.host.initial_state.is_null() || self.host.initial_state.is_object()) {
            return Err(BridgeError::BadConfig(
                "host.initial_state must be a mapping".into(),
            ));
        }
        self.bus.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Seed for the host state store; `data.<resource>` answers DATA_REQUEST.
    #[serde(default)]
    pub initial_state: Value,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            initial_state: Value::Null,
        }
    }
}

/// Per-bus tunables. Both sides of the boundary use the same section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Deadline applied by `send_and_wait` when the caller gives none.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    #[serde(default = "default_max_pending_requests")]
    pub max_pending_requests: usize,

    /// Raw channel queue depth (frames).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            max_pending_requests: default_max_pending_requests(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=600_000).contains(&self.default_timeout_ms) {
            return Err(BridgeError::BadConfig(
                "bus.default_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        if !(1..=65_536).contains(&self.max_pending_requests) {
            return Err(BridgeError::BadConfig(
                "bus.max_pending_requests must be between 1 and 65536".into(),
            ));
        }
        if !(1..=65_536).contains(&self.channel_capacity) {
            return Err(BridgeError::BadConfig(
                "bus.channel_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

fn default_listen() -> String {
    "127.0.0.1:8787".into()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_max_pending_requests() -> usize {
    1024
}
fn default_channel_capacity() -> usize {
    256
}
