//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::cache::DEFAULT_CAPACITY;

/// Root configuration for the dispatcher and its demo host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Listener configuration for the demo host.
    pub listener: ListenerConfig,

    /// Application settings consulted per request.
    pub app: AppConfig,

    /// Resolution cache settings.
    pub cache: CacheConfig,

    /// Route definitions, tried in order.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Application definition settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resolve `mojit-base`/`mojit-action` from the query string when no
    /// route pattern matches.
    pub allow_query_string_routing: bool,
}

/// Resolution cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of distinct "METHOD /path" keys kept.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// A single route definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Path pattern: literals, `:name` captures, and an optional trailing `*`.
    pub path: String,

    /// Dotted `"target.action"`, or `"*.*"` to take both from the
    /// `:module` and `:action` captures.
    pub call: String,

    /// HTTP methods this route answers.
    #[serde(default = "default_verbs")]
    pub verbs: Vec<String>,

    /// Extra parameters, query-string encoded (e.g. "sort=asc&page=1").
    #[serde(default)]
    pub params: String,
}

fn default_verbs() -> Vec<String> {
    vec!["GET".to_string()]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
