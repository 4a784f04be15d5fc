//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, resolver, cache produce:
//!     → logging.rs (structured log events under an injected span)
//!     → metrics.rs (cache lookups, dispatch outcomes, cache size)
//!
//! Consumers:
//!     → Log aggregation (stdout, human or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Metrics are cheap (atomic increments); without an installed recorder
//!   they are no-ops, so library users pay nothing

pub mod logging;
pub mod metrics;
