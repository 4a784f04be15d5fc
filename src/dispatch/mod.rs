//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, uri, RequestContext, RequestBody extensions)
//!     → store.rs (route table + app config for the context)
//!     → routing::RouteResolver (cache first)
//!     → middleware.rs (query-string fallback, target classification)
//!     → command.rs (Command inserted into request extensions)
//!     → next stage
//! ```

pub mod command;
pub mod middleware;
pub mod query;
pub mod store;

pub use command::{Command, CommandParams, RequestBody, RequestContext, Target};
pub use middleware::{dispatch_middleware, Dispatcher, Outcome};
pub use store::{ResourceStore, StaticStore};
