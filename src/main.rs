//! Route dispatch host.
//!
//! Runs the dispatch stage in an Axum pipeline and answers each request with
//! the command it was routed to.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ trace ─▶ timeout ─▶ dispatch ─▶ command handler
//!                                             │
//!                                  ┌──────────┴──────────┐
//!                                  │ resolution cache    │
//!                                  │   miss → RouteMaker │
//!                                  └──────────┬──────────┘
//!                                             │
//!                                  route table (hot reload)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use route_dispatch::config::watcher::{apply_reloads, ConfigWatcher};
use route_dispatch::config::{load_config, DispatchConfig};
use route_dispatch::observability::{logging, metrics};
use route_dispatch::HttpServer;

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "Serve resolved route commands over HTTP", long_about = None)]
struct Args {
    /// Route configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes when the config file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("route-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        cache_capacity = config.cache.capacity,
        query_string_routing = config.app.allow_query_string_routing,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config)?;

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_reloads(updates, server.store()));
            Some(watcher.run()?)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
