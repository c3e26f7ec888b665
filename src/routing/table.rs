//! Route table and lookup.
//!
//! # Responsibilities
//! - Store routes in declaration order
//! - Select the matching route for an admission context
//! - Reject tables with duplicate route ids
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First-match-wins: routes are evaluated in table order and
//!   evaluation stops at the first full match. Route order is a
//!   contract, not an implementation detail.
//! - Explicit no-match (`None`) rather than a silent default route

use std::collections::HashSet;

use crate::config::{ConfigError, Method, RouteConfig, ValidationError};
use crate::routing::predicate::{self, MatchContext, Predicate};

/// A compiled routing rule. Immutable after load.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub path_pattern: String,
    pub method: Method,
    pub backend_id: String,
    pub cacheable: bool,
    pub predicates: Vec<Predicate>,
}

impl Route {
    fn from_config(config: &RouteConfig) -> Self {
        Self {
            id: config.id.clone(),
            path_pattern: config.path.clone(),
            method: config.method,
            backend_id: config.backend.clone(),
            cacheable: config.cacheable,
            predicates: config
                .predicates
                .iter()
                .map(|p| Predicate {
                    id: p.id.clone(),
                    matched: p.matched,
                })
                .collect(),
        }
    }
}

/// Ordered, immutable collection of routes.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from configuration, preserving declaration order.
    /// Duplicate route ids are a config error.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for config in configs {
            if !seen.insert(config.id.as_str()) {
                return Err(ConfigError::Validation(vec![
                    ValidationError::DuplicateRouteId(config.id.clone()),
                ]));
            }
        }
        Ok(Self {
            routes: configs.iter().map(Route::from_config).collect(),
        })
    }

    /// All routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Select the first route that fully matches the context, or `None`.
    pub fn select(&self, ctx: &MatchContext) -> Option<&Route> {
        self.routes.iter().find(|r| predicate::evaluate(r, ctx))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
