//! Gate decisions: rate-limit and cache-hit.
//!
//! The original demo drew uncontrolled randoms inline; here the
//! decision source is injected so behavior is reproducible in tests
//! while the live default stays random. The engine always checks the
//! rate limiter first and consults the cache gate only for
//! cache-eligible routes.

use std::sync::Mutex;

use crate::config::GateConfig;

/// Source of gate decisions, injected at engine construction.
pub trait GateDecider: Send + Sync + std::fmt::Debug {
    /// Should this admission be rejected by the rate limiter?
    fn rate_limited(&self) -> bool;

    /// Should this cache-eligible admission be served from cache?
    fn cache_hit(&self) -> bool;
}

/// Probabilistic decider. The default, matching the demo's draws.
#[derive(Debug)]
pub struct RandomGate {
    rate_limit_probability: f64,
    cache_hit_probability: f64,
    rng: Mutex<fastrand::Rng>,
}

impl RandomGate {
    pub fn new(config: &GateConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    /// Seeded variant for reproducible runs.
    pub fn with_seed(config: &GateConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: &GateConfig, rng: fastrand::Rng) -> Self {
        Self {
            rate_limit_probability: config.rate_limit_probability,
            cache_hit_probability: config.cache_hit_probability,
            rng: Mutex::new(rng),
        }
    }

    fn draw(&self) -> f64 {
        self.rng.lock().expect("gate rng mutex poisoned").f64()
    }
}

impl GateDecider for RandomGate {
    fn rate_limited(&self) -> bool {
        self.draw() < self.rate_limit_probability
    }

    fn cache_hit(&self) -> bool {
        self.draw() < self.cache_hit_probability
    }
}

/// Fixed decider for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcedGate {
    pub rate_limit: bool,
    pub cache: bool,
}

impl GateDecider for ForcedGate {
    fn rate_limited(&self) -> bool {
        self.rate_limit
    }

    fn cache_hit(&self) -> bool {
        self.cache
    }
}
