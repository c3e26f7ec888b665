//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing backends)
//! - Validate value ranges (durations > 0, probabilities in [0, 1])
//! - Detect duplicate route and backend ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: SimConfig -> Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the engine

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::SimConfig;

/// A single semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate route id: {0}")]
    DuplicateRouteId(String),

    #[error("duplicate backend id: {0}")]
    DuplicateBackendId(String),

    #[error("route {route} references unknown backend {backend}")]
    UnknownBackendRef { route: String, backend: String },

    #[error("duplicate predicate id {predicate} in route {route}")]
    DuplicatePredicateId { route: String, predicate: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("{field} must be within [0.0, 1.0], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be within [1, 100], got {value}")]
    StepOutOfRange { field: &'static str, value: u32 },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut backend_ids = HashSet::new();
    for backend in &config.backends {
        if !backend_ids.insert(backend.id.as_str()) {
            errors.push(ValidationError::DuplicateBackendId(backend.id.clone()));
        }
    }

    let mut route_ids = HashSet::new();
    for route in &config.routes {
        if !route_ids.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRouteId(route.id.clone()));
        }
        if !backend_ids.contains(route.backend.as_str()) {
            errors.push(ValidationError::UnknownBackendRef {
                route: route.id.clone(),
                backend: route.backend.clone(),
            });
        }
        let mut predicate_ids = HashSet::new();
        for predicate in &route.predicates {
            if !predicate_ids.insert(predicate.id.as_str()) {
                errors.push(ValidationError::DuplicatePredicateId {
                    route: route.id.clone(),
                    predicate: predicate.id.clone(),
                });
            }
        }
    }

    let timing = &config.timing;
    for (field, value) in [
        ("timing.admission_interval_ms", timing.admission_interval_ms),
        ("timing.processing_delay_ms", timing.processing_delay_ms),
        ("timing.progress_interval_ms", timing.progress_interval_ms),
        ("timing.completed_linger_ms", timing.completed_linger_ms),
        (
            "timing.short_circuit_linger_ms",
            timing.short_circuit_linger_ms,
        ),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }

    if !(1..=100).contains(&timing.load_step) {
        errors.push(ValidationError::StepOutOfRange {
            field: "timing.load_step",
            value: timing.load_step,
        });
    }
    if !(1..=100).contains(&timing.progress_step) {
        errors.push(ValidationError::StepOutOfRange {
            field: "timing.progress_step",
            value: timing.progress_step as u32,
        });
    }

    for (field, value) in [
        (
            "gates.rate_limit_probability",
            config.gates.rate_limit_probability,
        ),
        (
            "gates.cache_hit_probability",
            config.gates.cache_hit_probability,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::ProbabilityOutOfRange { field, value });
        }
    }

    if config.visible_window == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "visible_window",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
