use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, Uri};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use route_dispatch::config::{load_config, DispatchConfig};
use route_dispatch::dispatch::{Dispatcher, RequestContext, StaticStore};
use route_dispatch::routing::RouteMaker;

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Inspect route resolution offline", long_about = None)]
struct Cli {
    /// Route configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request and print the command it would carry
    Resolve {
        /// HTTP method, e.g. GET
        method: String,
        /// Request URL path and query, e.g. "/news/1?page=2"
        url: String,
        /// Context entries as key=value
        #[arg(long = "context", value_parser = parse_key_value)]
        context: Vec<(String, String)>,
    },
    /// List compiled routes in match order
    Routes,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };

    let output = match cli.command {
        Commands::Resolve {
            method,
            url,
            context,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let uri: Uri = url.parse()?;
            let context: RequestContext = context.into_iter().collect();

            let store = StaticStore::from_config(&config)?;
            let dispatcher = Dispatcher::new(Arc::new(store), config.cache.capacity);
            match dispatcher.dispatch(&method, &uri, &context, None) {
                Some(command) => serde_json::to_value(&command)?,
                None => json!({ "matched": false }),
            }
        }
        Commands::Routes => {
            let maker = RouteMaker::new(&config.routes)?;
            Value::Array(
                maker
                    .routes()
                    .iter()
                    .map(|route| {
                        json!({
                            "name": route.name,
                            "path": route.path,
                            "call": route.call,
                            "verbs": route.verbs.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
                        })
                    })
                    .collect(),
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
