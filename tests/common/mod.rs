//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use route_dispatch::config::{parse_config, DispatchConfig};
use route_dispatch::HttpServer;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Routes used across the integration tests.
pub const ROUTES: &str = r#"
    [app]
    allow_query_string_routing = true

    [[routes]]
    name = "home"
    path = "/"
    call = "@page.index"

    [[routes]]
    name = "article"
    path = "/news/:id"
    call = "news.detail.show"
    params = "id=ignored&sort=asc"

    [[routes]]
    name = "update"
    path = "/news/:id"
    call = "news.update"
    verbs = ["POST", "PUT"]

    [[routes]]
    name = "catch-all"
    path = "/:module/:action"
    call = "*.*"
"#;

pub fn config() -> DispatchConfig {
    parse_config(ROUTES).unwrap()
}

/// Start the host on an ephemeral port. Send on the returned channel to stop it.
#[allow(dead_code)]
pub async fn start_server(config: &DispatchConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async move {
                let _ = stop_rx.await;
            })
            .await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, stop_tx)
}
