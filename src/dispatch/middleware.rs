//! Request dispatch middleware.
//!
//! # Responsibilities
//! - Resolve the request's method and URL to a route (cache first)
//! - Fall back to `mojit-base`/`mojit-action` query routing when enabled
//! - Build the command and attach it to the request extensions
//!
//! # Design Decisions
//! - Never produces a response of its own; unmatched requests pass through
//!   without a command and later stages decide what to do
//! - Resolution is synchronous; no lock is held across an await point

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};
use tracing::Span;

use crate::dispatch::command::{Command, CommandParams, RequestBody, RequestContext, Target};
use crate::dispatch::query::{merge_missing, parse_query};
use crate::dispatch::store::ResourceStore;
use crate::observability::metrics;
use crate::routing::cache::ResolutionCache;
use crate::routing::resolver::{normalize_trailing_slashes, RouteResolver};
use crate::routing::route::Params;

/// Query parameter naming the target for query-string routing.
pub const QUERY_BASE: &str = "mojit-base";
/// Query parameter naming the action for query-string routing.
pub const QUERY_ACTION: &str = "mojit-action";
/// Action used when query-string routing names none.
pub const DEFAULT_ACTION: &str = "index";

/// How a request was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Route,
    Fallback,
    PassThrough,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Route => "route",
            Outcome::Fallback => "fallback",
            Outcome::PassThrough => "pass_through",
        }
    }
}

struct Resolution {
    target: String,
    action: String,
    route: Params,
}

/// Builds commands for incoming requests.
///
/// Owns the resolution cache; one dispatcher is shared by all requests.
pub struct Dispatcher {
    store: Arc<dyn ResourceStore>,
    cache: ResolutionCache,
    span: Span,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ResourceStore>, cache_capacity: usize) -> Self {
        Self {
            store,
            cache: ResolutionCache::new(cache_capacity),
            span: Span::none(),
        }
    }

    /// Use `span` as the parent of everything this dispatcher logs.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Build the command for a request, or `None` if nothing routes it.
    pub fn dispatch(
        &self,
        method: &Method,
        uri: &Uri,
        context: &RequestContext,
        body: Option<&RequestBody>,
    ) -> Option<Command> {
        let table = self.store.routes(context);
        let app = self.store.app_config(context);
        let resolver = RouteResolver::new(&table, &self.cache).with_span(self.span.clone());

        let url_params = uri.query().map(parse_query).unwrap_or_default();
        let raw_url = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let url = normalize_trailing_slashes(raw_url);

        let (resolution, outcome) = match resolver.resolve(method, &url) {
            Some(route) => (
                Resolution {
                    target: route.target.clone(),
                    action: route.action.clone(),
                    route: merge_missing(route.query.clone(), parse_query(&route.param)),
                },
                Outcome::Route,
            ),
            None if app.allow_query_string_routing => match query_fallback(&url_params) {
                Some(resolution) => (resolution, Outcome::Fallback),
                None => return self.pass_through(method, &url),
            },
            None => return self.pass_through(method, &url),
        };

        metrics::record_dispatch(outcome.as_str());

        let body = match body {
            Some(RequestBody(value)) if !value.is_null() => value.clone(),
            _ => Value::Object(Map::new()),
        };

        let command = Command {
            instance: Target::classify(&resolution.target),
            action: resolution.action,
            context: context.clone(),
            params: CommandParams {
                route: resolution.route,
                url: url_params,
                body,
                file: Params::new(),
            },
        };

        tracing::debug!(
            parent: &self.span,
            method = %method,
            url = %url,
            outcome = outcome.as_str(),
            instance = ?command.instance,
            action = %command.action,
            "Attaching command"
        );
        Some(command)
    }

    /// Attach a command to `request` if it routes. Returns whether it did.
    pub fn attach(&self, request: &mut Request) -> bool {
        let context = request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        let command = self.dispatch(
            request.method(),
            request.uri(),
            &context,
            request.extensions().get::<RequestBody>(),
        );

        match command {
            Some(command) => {
                request.extensions_mut().insert(command);
                true
            }
            None => false,
        }
    }

    fn pass_through(&self, method: &Method, url: &str) -> Option<Command> {
        tracing::debug!(parent: &self.span, method = %method, url = %url, "Match fail, passing through");
        metrics::record_dispatch(Outcome::PassThrough.as_str());
        None
    }
}

fn query_fallback(query: &Params) -> Option<Resolution> {
    let target = query.get(QUERY_BASE).filter(|base| !base.is_empty())?;
    let action = query
        .get(QUERY_ACTION)
        .filter(|action| !action.is_empty())
        .map_or(DEFAULT_ACTION, String::as_str);

    Some(Resolution {
        target: target.clone(),
        action: action.to_string(),
        route: Params::new(),
    })
}

/// Middleware function attaching a [`Command`] to routed requests.
///
/// Always continues to the next stage, with or without a command.
pub async fn dispatch_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    mut request: Request,
    next: Next,
) -> Response {
    dispatcher.attach(&mut request);
    next.run(request).await
}
