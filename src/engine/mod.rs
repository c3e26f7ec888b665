//! Request lifecycle engine.
//!
//! # States
//! ```text
//! Admitted → RateLimited ──────────────┐
//!          → Cached ───────────────────┤ linger → Retired
//!          → Processing → Completed ───┘
//! ```
//! `RateLimited` and `Cached` short-circuit past `Processing` and never
//! touch backend load. A forwarded request increments its backend's
//! load on entering `Processing` and decrements it by the same amount
//! on completion; the pair always fires exactly once per request.
//!
//! # Design Decisions
//! - Every scheduled transition is a spawned timer task that captures
//!   the engine epoch at admission; `reset()` bumps the epoch so stale
//!   timers observe it and do nothing
//! - Stats and load mutations happen at the transition into a terminal
//!   state, never at retirement
//! - Snapshots expose only the most recent `visible_window` admissions,
//!   but eviction from the window is purely observational: the evicted
//!   request keeps its timers and releases its load on schedule
//! - `stop()` halts admission only; in-flight timers run to completion
//!   so no backend is left with inflated load

pub mod gate;
pub mod picker;
pub mod request;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::{Backend, BackendRegistry, UnknownBackend};
use crate::config::{validate_config, ConfigError, SimConfig, TimingConfig};
use crate::routing::{MatchContext, RouteTable};
use crate::stats::{Stats, StatsAggregator, StatsEvent};

pub use gate::{ForcedGate, GateDecider, RandomGate};
pub use picker::{RoundRobin, RoutePicker, UniformRandom};
pub use request::{InFlightRequest, RequestId, RequestState};

/// Why an admission was rejected. Rejections never mutate engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmitError {
    /// No route fully matched the admission context.
    #[error("no route matched")]
    NoRouteMatched,

    /// The matched route references a backend absent from the registry.
    /// Config validation makes this unreachable for loaded configs; it
    /// signals a configuration bug, not a runtime condition.
    #[error(transparent)]
    UnknownBackend(#[from] UnknownBackend),
}

/// Read-only, point-in-time view of the whole simulation.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub requests: Vec<InFlightRequest>,
    pub backends: Vec<Backend>,
    pub stats: Stats,
}

#[derive(Debug, Default)]
struct EngineState {
    /// Bumped on reset; timer tasks compare it before acting.
    epoch: u64,
    next_id: RequestId,
    /// Full in-flight set in admission order. The visible window is
    /// applied at snapshot time only.
    requests: Vec<InFlightRequest>,
    ticker: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    table: RouteTable,
    registry: BackendRegistry,
    stats: StatsAggregator,
    gate: Box<dyn GateDecider>,
    picker: Box<dyn RoutePicker>,
    timing: TimingConfig,
    visible_window: usize,
    created_at: Instant,
    state: Mutex<EngineState>,
}

/// The simulation engine. Cheap to clone handles are not needed; the
/// engine itself is `Send + Sync` and all methods take `&self`.
#[derive(Debug)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Build an engine from a validated config and injected strategies.
    pub fn new(
        config: SimConfig,
        gate: Box<dyn GateDecider>,
        picker: Box<dyn RoutePicker>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let table = RouteTable::from_config(&config.routes)?;
        let registry = BackendRegistry::new(&config.backends);

        Ok(Self {
            shared: Arc::new(Shared {
                table,
                registry,
                stats: StatsAggregator::default(),
                gate,
                picker,
                timing: config.timing,
                visible_window: config.visible_window,
                created_at: Instant::now(),
                state: Mutex::new(EngineState::default()),
            }),
        })
    }

    /// Build an engine with the default random gate and uniform-random
    /// route picker, the live-demo behavior.
    pub fn with_defaults(config: SimConfig) -> Result<Self, ConfigError> {
        let gate = Box::new(RandomGate::new(&config.gates));
        Self::new(config, gate, Box::new(UniformRandom::new()))
    }

    /// Admit a single request under the given context. Deterministic up
    /// to the injected gate decider. Must be called within a tokio
    /// runtime: lifecycle transitions are scheduled as timer tasks.
    pub fn admit_one(&self, ctx: &MatchContext) -> Result<InFlightRequest, AdmitError> {
        self.shared.admit(ctx)
    }

    /// Start the admission ticker. Idempotent.
    pub fn start(&self) {
        let mut st = self.shared.state.lock().expect("engine state mutex poisoned");
        if st.ticker.is_some() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let interval = self.shared.timing.admission_interval();
        st.ticker = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let ctx = shared.picker.pick(&shared.table);
                match shared.admit(&ctx) {
                    Ok(req) => tracing::trace!(id = req.id, "ticker admitted request"),
                    Err(err) => tracing::warn!(%err, "ticker admission rejected"),
                }
            }
        }));
        tracing::info!("simulation started");
    }

    /// Stop the admission ticker. Idempotent. In-flight requests keep
    /// their scheduled transitions, so any held load is still released.
    pub fn stop(&self) {
        let mut st = self.shared.state.lock().expect("engine state mutex poisoned");
        if let Some(ticker) = st.ticker.take() {
            ticker.abort();
            tracing::info!("simulation stopped");
        }
    }

    /// Hard reset: stop admitting, cancel every pending transition,
    /// clear in-flight requests, zero backend loads and stats. A timer
    /// scheduled before the reset can never act after it.
    pub fn reset(&self) {
        let mut st = self.shared.state.lock().expect("engine state mutex poisoned");
        if let Some(ticker) = st.ticker.take() {
            ticker.abort();
        }
        st.epoch += 1;
        st.requests.clear();
        self.shared.registry.reset_loads();
        self.shared.stats.reset();
        tracing::info!("simulation reset");
    }

    /// Whether the admission ticker is running.
    pub fn is_running(&self) -> bool {
        self.shared
            .state
            .lock()
            .expect("engine state mutex poisoned")
            .ticker
            .is_some()
    }

    /// Consistent point-in-time view: the most recent `visible_window`
    /// requests, all backends, and the stats counters.
    pub fn snapshot(&self) -> EngineSnapshot {
        let st = self.shared.state.lock().expect("engine state mutex poisoned");
        let skip = st.requests.len().saturating_sub(self.shared.visible_window);
        EngineSnapshot {
            requests: st.requests[skip..].to_vec(),
            backends: self.shared.registry.snapshot(),
            stats: self.shared.stats.snapshot(),
        }
    }

    /// Current stats counters.
    pub fn stats(&self) -> Stats {
        self.shared.stats.snapshot()
    }
}

impl Shared {
    fn admit(self: &Arc<Self>, ctx: &MatchContext) -> Result<InFlightRequest, AdmitError> {
        let route = self.table.select(ctx).ok_or(AdmitError::NoRouteMatched)?;

        let mut st = self.state.lock().expect("engine state mutex poisoned");
        let epoch = st.epoch;
        let id = st.next_id;

        let mut req = InFlightRequest {
            id,
            route_id: route.id.clone(),
            method: route.method,
            backend_id: route.backend_id.clone(),
            state: RequestState::Admitted,
            enqueued_at: self.created_at.elapsed().as_millis() as u64,
            progress: 0,
        };

        // Gate order is part of the contract: rate limit first, then
        // cache, and the cache gate only for cache-eligible routes.
        if self.gate.rate_limited() {
            req.state = RequestState::RateLimited;
            self.stats.record(StatsEvent::RateLimited);
            st.next_id += 1;
            st.requests.push(req.clone());
            drop(st);
            self.schedule_retire(id, epoch, self.timing.short_circuit_linger());
        } else if route.cacheable && self.gate.cache_hit() {
            req.state = RequestState::Cached;
            self.stats.record(StatsEvent::CacheHit);
            st.next_id += 1;
            st.requests.push(req.clone());
            drop(st);
            self.schedule_retire(id, epoch, self.timing.short_circuit_linger());
        } else {
            // On unknown backend nothing has been recorded yet, so the
            // failed admission leaves no trace.
            self.registry
                .increment_load(&route.backend_id, self.timing.load_step)?;
            req.state = RequestState::Processing;
            st.next_id += 1;
            st.requests.push(req.clone());
            drop(st);
            self.spawn_progress(id, epoch);
            self.spawn_completion(id, epoch, req.backend_id.clone());
        }

        tracing::debug!(id, route = %req.route_id, state = ?req.state, "request admitted");
        Ok(req)
    }

    /// Remove the request from the in-flight set after its linger.
    /// Retirement never mutates stats or backend load.
    fn schedule_retire(self: &Arc<Self>, id: RequestId, epoch: u64, linger: Duration) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            let mut st = shared.state.lock().expect("engine state mutex poisoned");
            if st.epoch != epoch {
                return;
            }
            st.requests.retain(|r| r.id != id);
            tracing::trace!(id, "request retired");
        });
    }

    /// Drive Processing → Completed: set progress to 100, release the
    /// load increment taken at admission, record the outcome, then
    /// schedule retirement.
    fn spawn_completion(self: &Arc<Self>, id: RequestId, epoch: u64, backend_id: String) {
        let shared = Arc::clone(self);
        let delay = self.timing.processing_delay();
        let linger = self.timing.completed_linger();
        let load_step = self.timing.load_step;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut st = shared.state.lock().expect("engine state mutex poisoned");
                if st.epoch != epoch {
                    return;
                }
                if let Some(req) = st.requests.iter_mut().find(|r| r.id == id) {
                    req.state = RequestState::Completed;
                    req.progress = 100;
                }
                if let Err(err) = shared.registry.decrement_load(&backend_id, load_step) {
                    tracing::error!(%err, id, "load release failed");
                }
                shared.stats.record(StatsEvent::Completed);
                tracing::debug!(id, backend = %backend_id, "request completed");
            }
            shared.schedule_retire(id, epoch, linger);
        });
    }

    /// Advance progress on a fixed cadence while the request stays in
    /// `Processing`; stops the moment it leaves that state.
    fn spawn_progress(self: &Arc<Self>, id: RequestId, epoch: u64) {
        let shared = Arc::clone(self);
        let interval = self.timing.progress_interval();
        let step = self.timing.progress_step;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let mut st = shared.state.lock().expect("engine state mutex poisoned");
                if st.epoch != epoch {
                    return;
                }
                let Some(req) = st.requests.iter_mut().find(|r| r.id == id) else {
                    return;
                };
                if req.state != RequestState::Processing {
                    return;
                }
                if req.progress + step < 100 {
                    req.progress += step;
                }
            }
        });
    }
}
