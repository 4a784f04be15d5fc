//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Build the span handed to dispatch components
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - JSON format for production, pretty format for development

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, from a binary.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("route_dispatch={},tower_http={}", config.log_level, config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Span under which a dispatcher logs.
pub fn dispatch_span(name: &str) -> Span {
    tracing::info_span!("dispatch", router = %name)
}
