//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route definitions compile and are uniquely named
//! - Validate value ranges (cache capacity > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DispatchConfig;
use crate::routing::matcher::{wildcard_is_resolvable, CompiledRoute, PatternError};

/// A single semantic problem in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cache.capacity must be greater than zero")]
    ZeroCacheCapacity,

    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("route '{0}' has an empty call")]
    EmptyCall(String),

    #[error("route '{0}' has no verbs")]
    NoVerbs(String),

    #[error("route '{0}' uses '*.*' without ':module' and ':action' captures")]
    UnresolvableWildcard(String),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache.capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if route.call.is_empty() {
            errors.push(ValidationError::EmptyCall(route.name.clone()));
        }

        if route.verbs.is_empty() {
            errors.push(ValidationError::NoVerbs(route.name.clone()));
        }

        match CompiledRoute::compile(route) {
            Ok(compiled) if !wildcard_is_resolvable(&compiled) => {
                errors.push(ValidationError::UnresolvableWildcard(route.name.clone()));
            }
            Ok(_) => {}
            Err(e) => errors.push(e.into()),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
