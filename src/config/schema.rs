//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the live proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The backend being proxied to.
    pub backend: BackendConfig,

    /// Liveness probe settings.
    pub probe: ProbeConfig,

    /// Status channel and landing page mount settings.
    pub status_channel: StatusChannelConfig,

    /// Landing page rendering.
    pub landing: LandingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., ":8080" or "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":8080".to_string(),
        }
    }
}

/// Backend the proxy forwards to once it accepts connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend address as `host:port` (e.g., "localhost:8081").
    pub address: String,

    /// URI scheme used when forwarding.
    pub scheme: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8081".to_string(),
            scheme: "http".to_string(),
        }
    }
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Dial timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

/// Status channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusChannelConfig {
    /// Path prefix the landing page and websocket are mounted under.
    pub path_prefix: String,

    /// Wait between liveness checks, in milliseconds.
    pub poll_interval_ms: u64,

    /// Subprotocols a client must offer one of. Empty accepts any client.
    pub subprotocols: Vec<String>,

    /// Additional allowed `Origin` hosts (`*` wildcard) besides same-host.
    pub origin_patterns: Vec<String>,
}

impl StatusChannelConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Path of the status channel websocket endpoint.
    pub fn websocket_path(&self) -> String {
        format!("{}/ws", self.path_prefix)
    }

    /// Path of the landing page.
    pub fn landing_path(&self) -> String {
        format!("{}/", self.path_prefix)
    }
}

impl Default for StatusChannelConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/_live-proxy".to_string(),
            poll_interval_ms: 1000,
            subprotocols: Vec::new(),
            origin_patterns: Vec::new(),
        }
    }
}

/// Landing page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LandingConfig {
    /// Page title.
    pub title: String,

    /// Absolute websocket URL the page connects to. When unset the page
    /// uses the relative status channel path.
    pub websocket_url: Option<String>,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            title: "Live Proxy Home".to_string(),
            websocket_url: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub log_level: String,

    /// Include source file and line in log lines.
    pub show_caller: bool,

    /// Include timestamps in log lines.
    pub show_time: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address for the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            show_caller: true,
            show_time: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
