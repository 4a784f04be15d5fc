//! Request routing layer for HTTP middleware pipelines.
//!
//! Resolves an inbound method and URL to a `{target, action}` pair through a
//! pluggable pattern engine, memoizes the resolution, and attaches a
//! [`Command`] to the request for the stages that follow.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::schema::DispatchConfig;
pub use dispatch::{dispatch_middleware, Command, Dispatcher, StaticStore, Target};
pub use http::HttpServer;
pub use routing::{PatternEngine, Route, RouteMatch, RouteResolver};
