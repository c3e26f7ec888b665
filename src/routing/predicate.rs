//! Predicate evaluation.
//!
//! Predicates are pre-evaluated booleans owned by exactly one route. A
//! route matches only if every predicate in its set holds (AND
//! semantics); an empty set matches trivially. A [`MatchContext`] can
//! override individual predicate outcomes per admission, which is what
//! makes route selection testable without a live expression language.

use std::collections::HashMap;

use crate::routing::table::Route;

/// A pre-evaluated boolean condition attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub id: String,
    pub matched: bool,
}

/// Per-admission input to route selection.
///
/// `path`, when set, must equal a route's pattern for that route to be a
/// candidate. `overrides` replace the static outcome of the predicate
/// with the same id.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    pub path: Option<String>,
    pub overrides: HashMap<String, bool>,
}

impl MatchContext {
    /// A context with no constraints: the first route whose predicates
    /// all hold is selected.
    pub fn any() -> Self {
        Self::default()
    }

    /// A context constrained to routes with the given path pattern.
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            overrides: HashMap::new(),
        }
    }

    /// Override the outcome of a single predicate for this admission.
    pub fn with_override(mut self, predicate_id: impl Into<String>, matched: bool) -> Self {
        self.overrides.insert(predicate_id.into(), matched);
        self
    }
}

/// Returns true if the route fully matches under the given context.
pub fn evaluate(route: &Route, ctx: &MatchContext) -> bool {
    if let Some(path) = &ctx.path {
        if *path != route.path_pattern {
            return false;
        }
    }
    route
        .predicates
        .iter()
        .all(|p| ctx.overrides.get(&p.id).copied().unwrap_or(p.matched))
}
