//! Route resolution.
//!
//! # Responsibilities
//! - Reduce a raw URL to the path used as cache key and match input
//! - Serve repeated lookups from the resolution cache
//! - Normalize a matched call into `(target, action)`
//!
//! # Design Decisions
//! - Cache hits never touch the pattern engine
//! - Misses are not memoized; unmatched paths are unbounded input
//! - The log span is injected, not looked up from global state

use std::borrow::Cow;
use std::sync::Arc;

use axum::http::Method;
use tracing::Span;

use crate::routing::cache::ResolutionCache;
use crate::routing::route::{Route, RouteMatch, RouteTable};

/// Resolves a method and URL against one route table.
pub struct RouteResolver<'a> {
    table: &'a RouteTable,
    cache: &'a ResolutionCache,
    span: Span,
}

impl<'a> RouteResolver<'a> {
    pub fn new(table: &'a RouteTable, cache: &'a ResolutionCache) -> Self {
        Self {
            table,
            cache,
            span: Span::none(),
        }
    }

    /// Use `span` as the parent of events emitted while resolving.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Find the normalized route for `method` and `raw_url`.
    pub fn resolve(&self, method: &Method, raw_url: &str) -> Option<Arc<Route>> {
        let path = normalize_trailing_slashes(strip_query(raw_url));
        let key = cache_key(method, &path);
        let generation = self.table.generation();

        if let Some(route) = self.cache.get(&key, generation) {
            tracing::trace!(parent: &self.span, key = %key, "Route served from cache");
            return Some(route);
        }

        let Some(matched) = self.table.engine().find(&path, method) else {
            tracing::debug!(parent: &self.span, key = %key, "No route matched");
            return None;
        };

        let route = Arc::new(normalize(matched));
        tracing::debug!(
            parent: &self.span,
            key = %key,
            call_target = %route.target,
            action = %route.action,
            generation,
            "Route resolved"
        );
        self.cache.put(key, generation, route.clone());
        Some(route)
    }
}

/// Cache key for a method and query-free path.
pub fn cache_key(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Drop everything from the first `?` on.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// Collapse a run of trailing slashes in the path into one.
///
/// The query string, if any, is left untouched. An empty path becomes `/`.
pub fn normalize_trailing_slashes(url: &str) -> Cow<'_, str> {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    let trimmed = path.trim_end_matches('/');
    if trimmed.len() + 1 >= path.len() && !path.is_empty() {
        return Cow::Borrowed(url);
    }

    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push_str(trimmed);
    normalized.push('/');
    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(query);
    }
    Cow::Owned(normalized)
}

/// Split a dotted call on its last `.` into `(target, action)`.
pub fn split_call(call: &str) -> (String, String) {
    match call.rsplit_once('.') {
        Some((target, action)) => (target.to_string(), action.to_string()),
        None => (String::new(), call.to_string()),
    }
}

fn normalize(matched: RouteMatch) -> Route {
    let call = if matched.is_wildcard() {
        let module = matched.query.get("module").map_or("", String::as_str);
        let action = matched.query.get("action").map_or("", String::as_str);
        Cow::Owned(format!("{module}.{action}"))
    } else {
        Cow::Borrowed(matched.call.as_str())
    };
    let (target, action) = split_call(&call);

    Route {
        target,
        action,
        query: matched.query,
        param: matched.param,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::PatternEngine;
    use crate::routing::route::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine double returning a fixed match for one path and counting calls.
    #[derive(Debug)]
    struct CountingEngine {
        path: &'static str,
        matched: RouteMatch,
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new(path: &'static str, matched: RouteMatch) -> Arc<Self> {
            Arc::new(Self {
                path,
                matched,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PatternEngine for CountingEngine {
        fn find(&self, path: &str, _method: &Method) -> Option<RouteMatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (path == self.path).then(|| self.matched.clone())
        }
    }

    /// Engine double that matches every path.
    #[derive(Debug, Default)]
    struct AnyEngine {
        calls: AtomicUsize,
    }

    impl PatternEngine for AnyEngine {
        fn find(&self, path: &str, _method: &Method) -> Option<RouteMatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(RouteMatch::new(format!("items.{}", path.trim_matches('/'))))
        }
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_trailing_slashes() {
        assert_eq!(normalize_trailing_slashes("/foo///"), "/foo/");
        assert_eq!(normalize_trailing_slashes("/foo/"), "/foo/");
        assert_eq!(normalize_trailing_slashes("/foo"), "/foo");
        assert_eq!(normalize_trailing_slashes("/"), "/");
        assert_eq!(normalize_trailing_slashes("///"), "/");
        assert_eq!(normalize_trailing_slashes(""), "/");
        assert_eq!(normalize_trailing_slashes("/foo//?a=1"), "/foo/?a=1");
        assert_eq!(normalize_trailing_slashes("?a=1"), "/?a=1");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/news?page=2"), "/news");
        assert_eq!(strip_query("/news"), "/news");
        assert_eq!(strip_query("/news?a=1?b=2"), "/news");
    }

    #[test]
    fn test_split_call() {
        assert_eq!(
            split_call("pages.detail.show"),
            ("pages.detail".to_string(), "show".to_string())
        );
        assert_eq!(split_call("news.list"), ("news".to_string(), "list".to_string()));
        assert_eq!(split_call("index"), (String::new(), "index".to_string()));
    }

    #[test]
    fn test_idempotent_caching() {
        let engine = CountingEngine::new("/news", RouteMatch::new("news.list"));
        let table = RouteTable::new(engine.clone(), 0);
        let cache = ResolutionCache::default();
        let resolver = RouteResolver::new(&table, &cache);

        let first = resolver.resolve(&Method::GET, "/news").unwrap();
        let second = resolver.resolve(&Method::GET, "/news?page=2").unwrap();

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn test_trailing_slash_shares_cache_key() {
        let engine = CountingEngine::new("/foo/", RouteMatch::new("foo.index"));
        let table = RouteTable::new(engine.clone(), 0);
        let cache = ResolutionCache::default();
        let resolver = RouteResolver::new(&table, &cache);

        let a = resolver.resolve(&Method::GET, "/foo///").unwrap();
        let b = resolver.resolve(&Method::GET, "/foo/").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.calls(), 1);
        assert!(cache.get("GET /foo/", 0).is_some());
    }

    #[test]
    fn test_method_is_part_of_key() {
        let engine = CountingEngine::new("/news", RouteMatch::new("news.list"));
        let table = RouteTable::new(engine.clone(), 0);
        let cache = ResolutionCache::default();
        let resolver = RouteResolver::new(&table, &cache);

        resolver.resolve(&Method::GET, "/news").unwrap();
        resolver.resolve(&Method::POST, "/news").unwrap();
        assert_eq!(engine.calls(), 2);
    }

    #[test]
    fn test_call_splitting() {
        let engine = CountingEngine::new("/p", RouteMatch::new("pages.detail.show"));
        let table = RouteTable::new(engine, 0);
        let cache = ResolutionCache::default();

        let route = RouteResolver::new(&table, &cache)
            .resolve(&Method::GET, "/p")
            .unwrap();
        assert_eq!(route.target, "pages.detail");
        assert_eq!(route.action, "show");
    }

    #[test]
    fn test_call_without_separator() {
        let engine = CountingEngine::new("/", RouteMatch::new("index"));
        let table = RouteTable::new(engine, 0);
        let cache = ResolutionCache::default();

        let route = RouteResolver::new(&table, &cache)
            .resolve(&Method::GET, "")
            .unwrap();
        assert_eq!(route.target, "");
        assert_eq!(route.action, "index");
    }

    #[test]
    fn test_wildcard_resolution() {
        let matched = RouteMatch::new("*.*")
            .with_query(params(&[("module", "news"), ("action", "list")]))
            .with_param("sort=asc");
        let engine = CountingEngine::new("/news/list", matched);
        let table = RouteTable::new(engine, 0);
        let cache = ResolutionCache::default();

        let route = RouteResolver::new(&table, &cache)
            .resolve(&Method::GET, "/news/list")
            .unwrap();
        assert_eq!(route.target, "news");
        assert_eq!(route.action, "list");
        assert_eq!(route.query, params(&[("module", "news"), ("action", "list")]));
        assert_eq!(route.param, "sort=asc");
    }

    #[test]
    fn test_negative_results_not_cached() {
        let engine = CountingEngine::new("/news", RouteMatch::new("news.list"));
        let table = RouteTable::new(engine.clone(), 0);
        let cache = ResolutionCache::default();
        let resolver = RouteResolver::new(&table, &cache);

        assert!(resolver.resolve(&Method::GET, "/missing").is_none());
        assert!(resolver.resolve(&Method::GET, "/missing").is_none());
        assert_eq!(engine.calls(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_forces_recompute() {
        let engine = Arc::new(AnyEngine::default());
        let table = RouteTable::new(engine.clone(), 0);
        let cache = ResolutionCache::default();
        let resolver = RouteResolver::new(&table, &cache);

        for i in 0..=1000 {
            resolver.resolve(&Method::GET, &format!("/item{i}")).unwrap();
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1001);

        resolver.resolve(&Method::GET, "/item0").unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1002);
    }

    #[test]
    fn test_new_generation_recomputes() {
        let engine = CountingEngine::new("/news", RouteMatch::new("news.list"));
        let cache = ResolutionCache::default();

        let old = RouteTable::new(engine.clone(), 1);
        RouteResolver::new(&old, &cache).resolve(&Method::GET, "/news").unwrap();

        let reloaded = RouteTable::new(engine.clone(), 2);
        RouteResolver::new(&reloaded, &cache).resolve(&Method::GET, "/news").unwrap();
        RouteResolver::new(&reloaded, &cache).resolve(&Method::GET, "/news").unwrap();

        assert_eq!(engine.calls(), 2);
    }
}
