//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch middleware installed
//! - Wire up cross-cutting layers (tracing, request timeout)
//! - Bind server to listener and shut down gracefully
//! - Answer with the attached command, standing in for the executor

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatchConfig;
use crate::dispatch::{dispatch_middleware, Command, Dispatcher, StaticStore};
use crate::observability::logging::dispatch_span;
use crate::routing::matcher::PatternError;

/// Demo host running the dispatch stage in front of a command echo handler.
pub struct HttpServer {
    router: Router,
    store: Arc<StaticStore>,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Compile the configured routes and assemble the pipeline.
    pub fn new(config: &DispatchConfig) -> Result<Self, PatternError> {
        let store = Arc::new(StaticStore::from_config(config)?);
        let dispatcher = Arc::new(
            Dispatcher::new(store.clone(), config.cache.capacity)
                .with_span(dispatch_span(&config.listener.bind_address)),
        );

        let router = Self::build_router(config, dispatcher.clone());
        Ok(Self {
            router,
            store,
            dispatcher,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &DispatchConfig, dispatcher: Arc<Dispatcher>) -> Router {
        Router::new().fallback(command_handler).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.listener.request_timeout_secs,
                )))
                .layer(middleware::from_fn_with_state(dispatcher, dispatch_middleware)),
        )
    }

    /// The store behind this server, for hot reload.
    pub fn store(&self) -> Arc<StaticStore> {
        self.store.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Clone of the assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Echo the attached command, or 404 when the request did not route.
async fn command_handler(request: Request) -> Response {
    match request.extensions().get::<Command>() {
        Some(command) => Json(command.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No route matched").into_response(),
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
