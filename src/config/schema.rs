//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the webhook proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Storage service the proxy forwards to.
    pub upstream: UpstreamConfig,

    /// Webhook notification settings.
    pub webhook: WebhookSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Header hygiene settings.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream storage service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Storage proxy address (e.g., "127.0.0.1:6000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6000".to_string(),
        }
    }
}

/// How a notification attempt relates to the client response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Detached task; the client response is returned immediately.
    #[default]
    Background,
    /// The client response waits for the attempt to finish or time out.
    Inline,
}

/// Webhook notification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Enable the webhook stage. When disabled the proxy is a plain pass-through.
    pub enabled: bool,

    /// Hard deadline for one notification attempt, in seconds.
    pub timeout_secs: u64,

    /// Background or inline delivery.
    pub dispatch: DispatchMode,

    /// User-Agent sent with notifications.
    pub user_agent: String,

    /// Scheme used for the resource URL when the request carries no
    /// `x-forwarded-proto`.
    pub default_scheme: String,

    /// Public base URL of the storage service (e.g. "https://storage.example.com").
    /// Overrides the scheme and host taken from the request.
    pub public_url: Option<String>,
}

impl WebhookSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 20,
            dispatch: DispatchMode::Background,
            user_agent: concat!("swift-webhook/", env!("CARGO_PKG_VERSION")).to_string(),
            default_scheme: "http".to_string(),
            public_url: None,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            // Object uploads are long-lived; inline dispatch adds up to the webhook deadline.
            request_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Header hygiene configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Remove system metadata headers from client requests and responses.
    pub strip_sysmeta: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { strip_sysmeta: true }
    }
}
