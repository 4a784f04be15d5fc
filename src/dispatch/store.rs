//! Resource store: where the dispatcher gets routes and app settings.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::config::{AppConfig, DispatchConfig};
use crate::dispatch::command::RequestContext;
use crate::routing::matcher::{PatternError, RouteMaker};
use crate::routing::route::RouteTable;

/// Source of route tables and application settings for a request context.
pub trait ResourceStore: Send + Sync {
    fn routes(&self, context: &RequestContext) -> Arc<RouteTable>;

    fn app_config(&self, context: &RequestContext) -> Arc<AppConfig>;
}

/// Route table and settings published together.
#[derive(Debug)]
struct Snapshot {
    routes: Arc<RouteTable>,
    app: Arc<AppConfig>,
}

/// Store serving one route table to every context.
///
/// The table can be replaced at runtime; each replacement gets a new
/// generation so cached resolutions from the old table are ignored.
/// Routes and settings are swapped as one snapshot, and reloads are
/// serialized so generations are published in order.
pub struct StaticStore {
    current: ArcSwap<Snapshot>,
    reload_lock: Mutex<()>,
}

impl StaticStore {
    pub fn new(table: RouteTable, app: AppConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot {
                routes: Arc::new(table),
                app: Arc::new(app),
            }),
            reload_lock: Mutex::new(()),
        }
    }

    /// Compile the configured routes into a store.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, PatternError> {
        let maker = RouteMaker::new(&config.routes)?;
        Ok(Self::new(
            RouteTable::new(Arc::new(maker), 0),
            config.app.clone(),
        ))
    }

    /// Swap in routes and settings from a new configuration.
    ///
    /// On a compile error the current table stays in place.
    pub fn reload(&self, config: &DispatchConfig) -> Result<u64, PatternError> {
        let maker = RouteMaker::new(&config.routes)?;

        // Holds no data; the guard only orders concurrent reloads.
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation() + 1;
        self.current.store(Arc::new(Snapshot {
            routes: Arc::new(RouteTable::new(Arc::new(maker), generation)),
            app: Arc::new(config.app.clone()),
        }));

        tracing::info!(
            generation,
            routes = config.routes.len(),
            "Route table reloaded"
        );
        Ok(generation)
    }

    pub fn generation(&self) -> u64 {
        self.current.load().routes.generation()
    }
}

impl ResourceStore for StaticStore {
    fn routes(&self, _context: &RequestContext) -> Arc<RouteTable> {
        self.current.load().routes.clone()
    }

    fn app_config(&self, _context: &RequestContext) -> Arc<AppConfig> {
        self.current.load().app.clone()
    }
}
