//! Configuration structures.
//!
//! Every section has a `Default` so an embedding host can start from
//! `Config::default()` and override only what it needs, or load a JSON
//! document with missing sections filled in.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Result;

/// Global relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Relay and host dispatch behaviour.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Relay and host dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Make a newly bound relay the registry's current relay, the one
    /// reached by engine code that has no context id.
    pub make_current_on_bind: bool,

    /// Publish emissions already queued when the host shuts down.
    pub drain_on_shutdown: bool,

    /// Reject events that no registered module declares in
    /// `supported_events()`.
    pub enforce_supported_events: bool,

    /// Upper bound on waiting for the dispatch loop in `HostContext::shutdown`.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            make_current_on_bind: true,
            drain_on_shutdown: true,
            enforce_supported_events: true,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}
