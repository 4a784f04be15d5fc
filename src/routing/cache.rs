//! Resolution cache.
//!
//! Bounded memo of `"METHOD /path"` to the normalized route computed for it.
//! Entries are tagged with the route-table generation that produced them so
//! a reloaded table never serves a stale route.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

use crate::observability::metrics;
use crate::routing::route::Route;

/// Default number of distinct keys kept.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug)]
struct CacheEntry {
    generation: u64,
    route: Arc<Route>,
}

/// Thread-safe LRU cache of resolved routes.
#[derive(Debug)]
pub struct ResolutionCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
}

impl ResolutionCache {
    /// Create a cache holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a route computed from the table at `generation`.
    pub fn get(&self, key: &str, generation: u64) -> Option<Arc<Route>> {
        let hit = match self.lock().get(key) {
            Some(entry) if entry.generation == generation => Some(entry.route.clone()),
            _ => None,
        };
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Store a route, evicting the least recently used key when full.
    ///
    /// A key already holding a route of the same generation keeps it; the
    /// first resolution stored wins and is only refreshed in recency.
    pub fn put(&self, key: String, generation: u64, route: Arc<Route>) {
        let mut inner = self.lock();
        if matches!(inner.get(&key), Some(entry) if entry.generation == generation) {
            return;
        }
        match inner.push(key, CacheEntry { generation, route }) {
            Some((evicted, _)) if !inner.contains(&evicted) => {
                tracing::trace!(key = %evicted, "Resolution cache entry evicted");
            }
            _ => {}
        }
        metrics::record_cache_size(inner.len());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    // Entries are immutable, so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
