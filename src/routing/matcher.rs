//! Route matching logic.
//!
//! # Responsibilities
//! - Define the pattern engine contract used by the resolver
//! - Compile route definitions into segment patterns
//! - Match a path and method, capturing named segments
//!
//! # Design Decisions
//! - Path matching is case-sensitive, method matching is exact
//! - A single trailing slash is ignored on both sides
//! - No regex: segment comparison keeps matching O(segments)
//! - First declared route wins

use axum::http::Method;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::route::{Params, RouteMatch, WILDCARD_CALL};

/// Trait for engines that map a path and method to a route definition.
pub trait PatternEngine: Send + Sync + std::fmt::Debug {
    /// Returns the first route matching `path` for `method`, if any.
    fn find(&self, path: &str, method: &Method) -> Option<RouteMatch>;
}

/// Error raised while compiling route definitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("route '{route}': path '{path}' must start with '/'")]
    InvalidPath { route: String, path: String },

    #[error("route '{route}': '*' is only allowed as the last segment")]
    MisplacedRest { route: String },

    #[error("route '{route}': capture segment has no name")]
    UnnamedCapture { route: String },

    #[error("route '{route}': invalid verb '{verb}'")]
    InvalidVerb { route: String, verb: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
    Rest,
}

/// One compiled route definition.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub name: String,
    pub path: String,
    pub call: String,
    pub verbs: Vec<Method>,
    params: String,
    segments: Vec<Segment>,
}

impl CompiledRoute {
    pub fn compile(config: &RouteConfig) -> Result<Self, PatternError> {
        if !config.path.starts_with('/') {
            return Err(PatternError::InvalidPath {
                route: config.name.clone(),
                path: config.path.clone(),
            });
        }

        let raw: Vec<&str> = split_segments(&config.path).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, seg) in raw.iter().enumerate() {
            let segment = if *seg == "*" {
                if i + 1 != raw.len() {
                    return Err(PatternError::MisplacedRest {
                        route: config.name.clone(),
                    });
                }
                Segment::Rest
            } else if let Some(name) = seg.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::UnnamedCapture {
                        route: config.name.clone(),
                    });
                }
                Segment::Capture(name.to_string())
            } else {
                Segment::Literal(seg.to_string())
            };
            segments.push(segment);
        }

        let verbs = config
            .verbs
            .iter()
            .map(|verb| {
                Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).map_err(|_| {
                    PatternError::InvalidVerb {
                        route: config.name.clone(),
                        verb: verb.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            path: config.path.clone(),
            call: config.call.clone(),
            verbs,
            params: config.params.clone(),
            segments,
        })
    }

    /// Names captured by this route's pattern.
    pub fn captures(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn accepts(&self, method: &Method) -> bool {
        self.verbs.iter().any(|v| v == method)
    }

    fn capture(&self, path: &str) -> Option<Params> {
        let mut query = Params::new();
        let mut req_it = split_segments(path);

        for segment in &self.segments {
            match segment {
                Segment::Rest => return Some(query),
                Segment::Literal(expected) => {
                    if req_it.next()? != expected.as_str() {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    let value = req_it.next()?;
                    query.insert(name.clone(), value.to_string());
                }
            }
        }

        req_it.next().is_none().then_some(query)
    }
}

/// Splits a path into its non-root segments, ignoring one trailing slash.
fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').filter(|s| !s.is_empty())
}

/// The bundled pattern engine, compiled from configured route definitions.
#[derive(Debug, Default)]
pub struct RouteMaker {
    routes: Vec<CompiledRoute>,
}

impl RouteMaker {
    /// Compile route definitions in declaration order.
    pub fn new(configs: &[RouteConfig]) -> Result<Self, PatternError> {
        let routes = configs
            .iter()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }
}

impl PatternEngine for RouteMaker {
    fn find(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.accepts(method))
            .find_map(|route| {
                route.capture(path).map(|query| {
                    tracing::trace!(route = %route.name, path = %path, "Pattern matched");
                    RouteMatch::new(route.call.clone())
                        .with_query(query)
                        .with_param(route.params.clone())
                })
            })
    }
}

/// Returns true if a wildcard route can supply both module and action.
pub fn wildcard_is_resolvable(route: &CompiledRoute) -> bool {
    if route.call != WILDCARD_CALL {
        return true;
    }
    let captures: Vec<&str> = route.captures().collect();
    captures.contains(&"module") && captures.contains(&"action")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, path: &str, call: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path: path.into(),
            call: call.into(),
            verbs: vec!["get".into()],
            params: String::new(),
        }
    }

    #[test]
    fn test_literal_and_capture() {
        let maker = RouteMaker::new(&[
            route("root", "/", "home.index"),
            route("item", "/news/:id", "news.show"),
        ])
        .unwrap();

        let root = maker.find("/", &Method::GET).unwrap();
        assert_eq!(root.call, "home.index");
        assert!(root.query.is_empty());

        let item = maker.find("/news/42/", &Method::GET).unwrap();
        assert_eq!(item.call, "news.show");
        assert_eq!(item.query.get("id").map(String::as_str), Some("42"));

        assert!(maker.find("/news", &Method::GET).is_none());
        assert!(maker.find("/news/42/comments", &Method::GET).is_none());
    }

    #[test]
    fn test_verbs_and_order() {
        let mut post = route("create", "/news/:id", "news.update");
        post.verbs = vec!["POST".into(), "PUT".into()];
        let maker = RouteMaker::new(&[post, route("show", "/news/:id", "news.show")]).unwrap();

        assert_eq!(maker.find("/news/1", &Method::PUT).unwrap().call, "news.update");
        assert_eq!(maker.find("/news/1", &Method::GET).unwrap().call, "news.show");
        assert!(maker.find("/news/1", &Method::DELETE).is_none());
    }

    #[test]
    fn test_rest_segment() {
        let mut catch_all = route("static", "/static/*", "assets.serve");
        catch_all.params = "cache=long".into();
        let maker = RouteMaker::new(&[catch_all]).unwrap();

        let hit = maker.find("/static/css/site.css", &Method::GET).unwrap();
        assert_eq!(hit.call, "assets.serve");
        assert_eq!(hit.param, "cache=long");
        assert!(maker.find("/static", &Method::GET).is_some());
        assert!(maker.find("/other", &Method::GET).is_none());
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            RouteMaker::new(&[route("bad", "news", "a.b")]),
            Err(PatternError::InvalidPath { .. })
        ));
        assert!(matches!(
            RouteMaker::new(&[route("bad", "/*/x", "a.b")]),
            Err(PatternError::MisplacedRest { .. })
        ));
        assert!(matches!(
            RouteMaker::new(&[route("bad", "/:", "a.b")]),
            Err(PatternError::UnnamedCapture { .. })
        ));

        let mut bad_verb = route("bad", "/", "a.b");
        bad_verb.verbs = vec!["NOT A VERB".into()];
        assert!(matches!(
            RouteMaker::new(&[bad_verb]),
            Err(PatternError::InvalidVerb { .. })
        ));
    }

    #[test]
    fn test_wildcard_resolvable() {
        let maker = RouteMaker::new(&[
            route("wild", "/:module/:action", "*.*"),
            route("half", "/:module", "*.*"),
        ])
        .unwrap();
        assert!(wildcard_is_resolvable(&maker.routes()[0]));
        assert!(!wildcard_is_resolvable(&maker.routes()[1]));
    }
}
