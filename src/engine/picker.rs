//! Route picking strategies for the admission ticker.
//!
//! Which route incoming traffic targets is a strategy, explicit and
//! swappable. The demo's pick was uniform-random despite its
//! round-robin label; both are provided here and the engine takes
//! whichever it is given.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::routing::{MatchContext, RouteTable};

/// Produces the admission context for each ticker tick.
pub trait RoutePicker: Send + Sync + std::fmt::Debug {
    fn pick(&self, table: &RouteTable) -> MatchContext;
}

/// Uniform-random pick over the route table. The default, matching the
/// demo's behavior.
#[derive(Debug)]
pub struct UniformRandom {
    rng: Mutex<fastrand::Rng>,
}

impl UniformRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Seeded variant for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for UniformRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutePicker for UniformRandom {
    fn pick(&self, table: &RouteTable) -> MatchContext {
        let routes = table.routes();
        if routes.is_empty() {
            return MatchContext::any();
        }
        let index = self
            .rng
            .lock()
            .expect("picker rng mutex poisoned")
            .usize(..routes.len());
        MatchContext::for_path(routes[index].path_pattern.clone())
    }
}

/// Rotates through routes in table order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoutePicker for RoundRobin {
    fn pick(&self, table: &RouteTable) -> MatchContext {
        let routes = table.routes();
        if routes.is_empty() {
            return MatchContext::any();
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % routes.len();
        MatchContext::for_path(routes[index].path_pattern.clone())
    }
}
