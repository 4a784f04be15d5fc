//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, url)
//!     → resolver.rs (strip query, normalize trailing slashes)
//!     → cache.rs (lookup "METHOD /path")
//!     → on miss: matcher.rs (PatternEngine::find)
//!     → normalize call into (target, action)
//!     → Return: shared Route or no match
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → RouteMaker (segment patterns, verbs)
//!     → Freeze as immutable RouteTable with a generation number
//! ```
//!
//! # Design Decisions
//! - The pattern engine is a trait object; the resolver never depends on
//!   a concrete route compiler
//! - Only positive matches are memoized
//! - Normalized routes are immutable and shared via Arc
//! - First match wins (declaration order)

pub mod cache;
pub mod matcher;
pub mod resolver;
pub mod route;

pub use cache::ResolutionCache;
pub use matcher::{CompiledRoute, PatternEngine, PatternError, RouteMaker};
pub use resolver::RouteResolver;
pub use route::{Params, Route, RouteMatch, RouteTable};
