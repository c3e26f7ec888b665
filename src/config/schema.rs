//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! simulation. All types derive Serde traits for deserialization from
//! config files. Defaults reproduce the canonical demo topology and
//! timings, so an empty `[timing]`/`[gates]` table is a valid config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the simulation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Route definitions, in match-priority order.
    pub routes: Vec<RouteConfig>,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,

    /// Timing parameters for lifecycle transitions.
    pub timing: TimingConfig,

    /// Gate decision probabilities.
    pub gates: GateConfig,

    /// How many of the most recent in-flight requests a snapshot exposes.
    pub visible_window: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            backends: Vec::new(),
            timing: TimingConfig::default(),
            gates: GateConfig::default(),
            visible_window: 8,
        }
    }
}

impl SimConfig {
    /// The built-in demo topology: three backends, three routes, two of
    /// them cache-eligible.
    pub fn demo() -> Self {
        Self {
            routes: vec![
                RouteConfig {
                    id: "users".into(),
                    path: "/api/users".into(),
                    method: Method::Get,
                    backend: "api1".into(),
                    cacheable: true,
                    predicates: Vec::new(),
                },
                RouteConfig {
                    id: "orders".into(),
                    path: "/api/orders".into(),
                    method: Method::Post,
                    backend: "api2".into(),
                    cacheable: false,
                    predicates: Vec::new(),
                },
                RouteConfig {
                    id: "products".into(),
                    path: "/api/products".into(),
                    method: Method::Get,
                    backend: "api3".into(),
                    cacheable: true,
                    predicates: Vec::new(),
                },
            ],
            backends: vec![
                BackendConfig {
                    id: "api1".into(),
                    name: "API Server 1".into(),
                    health: Health::Healthy,
                },
                BackendConfig {
                    id: "api2".into(),
                    name: "API Server 2".into(),
                    health: Health::Healthy,
                },
                BackendConfig {
                    id: "api3".into(),
                    name: "API Server 3".into(),
                    health: Health::Healthy,
                },
            ],
            ..Self::default()
        }
    }
}

/// HTTP method carried by routes and simulated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Backend health status. The engine reports it in snapshots but never
/// mutates it; it is part of the configured topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    #[default]
    Healthy,
    Degraded,
    Down,
}

/// Route configuration mapping matched requests to a backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Unique route identifier.
    pub id: String,

    /// Path pattern to match (exact match). Need not be unique across
    /// routes; ambiguity is resolved by declaration order.
    pub path: String,

    /// HTTP method for this route.
    #[serde(default)]
    pub method: Method,

    /// Backend this route forwards to.
    pub backend: String,

    /// Whether responses for this route may be served from cache.
    #[serde(default)]
    pub cacheable: bool,

    /// Pre-evaluated predicate conditions, combined with AND semantics.
    #[serde(default)]
    pub predicates: Vec<PredicateConfig>,
}

/// A single pre-evaluated predicate condition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredicateConfig {
    /// Predicate identifier, unique within its route.
    pub id: String,

    /// The pre-evaluated outcome of the condition.
    pub matched: bool,
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Configured health status.
    #[serde(default)]
    pub health: Health,
}

/// Timing parameters for lifecycle transitions.
///
/// All durations are milliseconds. Defaults match the demo cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interval between ticker admissions.
    pub admission_interval_ms: u64,

    /// How long a forwarded request stays in `Processing`.
    pub processing_delay_ms: u64,

    /// Cadence of progress advancement while `Processing`.
    pub progress_interval_ms: u64,

    /// Linger between `Completed` and retirement.
    pub completed_linger_ms: u64,

    /// Linger between a short-circuit outcome (cached, rate-limited) and
    /// retirement.
    pub short_circuit_linger_ms: u64,

    /// Backend load added on entering `Processing` and removed on
    /// completion.
    pub load_step: u32,

    /// Progress percentage added per progress interval.
    pub progress_step: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            admission_interval_ms: 1500,
            processing_delay_ms: 2000,
            progress_interval_ms: 200,
            completed_linger_ms: 1000,
            short_circuit_linger_ms: 1500,
            load_step: 20,
            progress_step: 10,
        }
    }
}

impl TimingConfig {
    pub fn admission_interval(&self) -> Duration {
        Duration::from_millis(self.admission_interval_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn completed_linger(&self) -> Duration {
        Duration::from_millis(self.completed_linger_ms)
    }

    pub fn short_circuit_linger(&self) -> Duration {
        Duration::from_millis(self.short_circuit_linger_ms)
    }
}

/// Gate decision probabilities for the default random decider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Probability that an admission is rejected by the rate limiter.
    pub rate_limit_probability: f64,

    /// Probability that a cache-eligible admission is served from cache.
    pub cache_hit_probability: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate_limit_probability: 0.1,
            cache_hit_probability: 0.3,
        }
    }
}
