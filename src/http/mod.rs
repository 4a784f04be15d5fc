//! HTTP host pipeline.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → dispatch::dispatch_middleware (attach Command)
//!     → command handler (echo command as JSON, 404 without one)
//! ```

pub mod server;

pub use server::HttpServer;
