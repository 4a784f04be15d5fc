//! The command attached to routed requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::route::Params;

/// Prefix marking a target as a type rather than a base instance.
pub const TYPE_SIGIL: char = '@';

/// What a command executes: a type, or a configured base instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Type(String),
    Base(String),
}

impl Target {
    /// `@name` is the type `name`; anything else is a base instance.
    pub fn classify(target: &str) -> Self {
        match target.strip_prefix(TYPE_SIGIL) {
            Some(name) => Target::Type(name.to_string()),
            None => Target::Base(target.to_string()),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Target::Type(name) => Some(name),
            Target::Base(_) => None,
        }
    }

    pub fn base(&self) -> Option<&str> {
        match self {
            Target::Base(name) => Some(name),
            Target::Type(_) => None,
        }
    }
}

/// Opaque per-request context, set upstream and copied into the command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestContext(pub BTreeMap<String, String>);

impl RequestContext {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Request body as decoded by an upstream body parser.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody(pub Value);

/// Parameters handed to the executed action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandParams {
    /// Route-derived parameters merged with the route's residual params.
    pub route: Params,
    /// Parsed request query string.
    pub url: Params,
    pub body: Value,
    /// Reserved for multipart uploads; always empty.
    pub file: Params,
}

/// Descriptor telling the downstream pipeline what to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub instance: Target,
    pub action: String,
    pub context: RequestContext,
    pub params: CommandParams,
}
