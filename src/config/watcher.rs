//! Route config watcher for hot reload.
//!
//! File events are debounced by notify's poll interval; every change that
//! loads and validates is forwarded over a channel and applied to the store
//! by [`apply_reloads`]. A config that fails to load never replaces the
//! routes currently being served.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::DispatchConfig;
use crate::dispatch::store::StaticStore;

/// Watches one route config file.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<DispatchConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its reloads.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DispatchConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let watched = path.clone();

        let handler = move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Route config watch error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }

            match load_config(&path) {
                Ok(config) => {
                    if updates.send(config).is_err() {
                        tracing::warn!("Reload receiver dropped, ignoring change");
                    }
                }
                Err(e) => {
                    tracing::error!(path = ?path, error = %e, "Rejected route config, keeping current routes");
                }
            }
        };

        let mut watcher = RecommendedWatcher::new(
            handler,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Route config watcher started");
        Ok(watcher)
    }
}

/// Apply reloaded configs to `store` until the sender side closes.
pub async fn apply_reloads(
    mut updates: mpsc::UnboundedReceiver<DispatchConfig>,
    store: Arc<StaticStore>,
) {
    while let Some(config) = updates.recv().await {
        if let Err(e) = store.reload(&config) {
            tracing::error!(error = %e, "Route table reload failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::dispatch::command::RequestContext;
    use crate::dispatch::store::ResourceStore;

    #[tokio::test]
    async fn test_apply_reloads() {
        let store = Arc::new(StaticStore::from_config(&DispatchConfig::default()).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();

        let mut next = DispatchConfig::default();
        next.routes.push(RouteConfig {
            name: "home".into(),
            path: "/".into(),
            call: "home.index".into(),
            verbs: vec!["GET".into()],
            params: String::new(),
        });
        tx.send(next).unwrap();
        drop(tx);

        apply_reloads(rx, store.clone()).await;
        assert_eq!(store.generation(), 1);
        assert!(store
            .routes(&RequestContext::default())
            .engine()
            .find("/", &axum::http::Method::GET)
            .is_some());
    }

    #[tokio::test]
    async fn test_file_change_sends_update() {
        let path = std::env::temp_dir().join(format!(
            "route_dispatch_watch_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        std::fs::write(
            &path,
            "[[routes]]\nname = \"home\"\npath = \"/\"\ncall = \"home.index\"\n",
        )
        .unwrap();

        // A truncate can surface as its own event carrying the empty file.
        let received = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match rx.recv().await {
                    Some(config) if config.routes.len() == 1 => break Some(config),
                    Some(_) => continue,
                    None => break None,
                }
            }
        })
        .await;

        std::fs::remove_file(&path).unwrap_or_default();
        let config = received
            .expect("no update within timeout")
            .expect("watcher channel closed");
        assert_eq!(config.routes[0].call, "home.index");
    }
}
