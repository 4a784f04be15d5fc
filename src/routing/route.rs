//! Route data types.
//!
//! A pattern engine produces a [`RouteMatch`], whose `call` is still the
//! dotted string from the route definition. The resolver turns it into a
//! [`Route`] exactly once; after that the route is frozen and shared.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::matcher::PatternEngine;

/// Parameter bag keyed by name. Ordered so serialized commands are stable.
pub type Params = BTreeMap<String, String>;

/// Call value meaning "take module and action from the matched parameters".
pub const WILDCARD_CALL: &str = "*.*";

/// Raw result of matching a path against a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Dotted `"module.action"` or [`WILDCARD_CALL`].
    pub call: String,
    /// Parameters captured from the URL pattern.
    pub query: Params,
    /// Residual parameters, still query-string encoded.
    pub param: String,
}

impl RouteMatch {
    pub fn new(call: impl Into<String>) -> Self {
        Self {
            call: call.into(),
            query: Params::new(),
            param: String::new(),
        }
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.call == WILDCARD_CALL
    }
}

/// A normalized route. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub target: String,
    pub action: String,
    pub query: Params,
    pub param: String,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.action)
    }
}

/// The compiled routes for one context, tagged with the generation they
/// were loaded in.
#[derive(Debug, Clone)]
pub struct RouteTable {
    engine: Arc<dyn PatternEngine>,
    generation: u64,
}

impl RouteTable {
    pub fn new(engine: Arc<dyn PatternEngine>, generation: u64) -> Self {
        Self { engine, generation }
    }

    pub fn engine(&self) -> &dyn PatternEngine {
        self.engine.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
