//! Backend registry with load accounting.
//!
//! # Responsibilities
//! - Track per-backend load as a saturating counter in [0, 100]
//! - Serialize same-backend load mutations (CAS on an atomic)
//! - Hand out value-copy snapshots, never mutable references
//!
//! # Design Decisions
//! - Load is mutated exclusively by the lifecycle engine
//! - Increments clamp at 100, decrements floor at 0
//! - Unknown backend ids are reported, not panicked on: they indicate a
//!   configuration bug and config validation makes them unreachable for
//!   loaded configs

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use serde::Serialize;
use thiserror::Error;

use crate::config::{BackendConfig, Health};

/// Upper bound for a backend's load percentage.
pub const MAX_LOAD: u32 = 100;

/// Raised when an operation names a backend absent from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backend: {0}")]
pub struct UnknownBackend(pub String);

/// Value-copy view of a backend, safe to hand to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backend {
    pub id: String,
    pub name: String,
    pub load: u32,
    pub health: Health,
}

#[derive(Debug)]
struct Slot {
    id: String,
    name: String,
    health: Health,
    load: AtomicU32,
}

impl Slot {
    /// Apply `f` to the load with a CAS loop so concurrent mutations of
    /// the same backend cannot break the [0, 100] clamp.
    fn update_load(&self, f: impl Fn(u32) -> u32) -> u32 {
        let mut prev = self.load.load(Ordering::Relaxed);
        loop {
            let next = f(prev);
            match self
                .load
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}

/// Registry of all configured backends, in registration order.
#[derive(Debug)]
pub struct BackendRegistry {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl BackendRegistry {
    pub fn new(configs: &[BackendConfig]) -> Self {
        let slots: Vec<Slot> = configs
            .iter()
            .map(|config| Slot {
                id: config.id.clone(),
                name: config.name.clone(),
                health: config.health,
                load: AtomicU32::new(0),
            })
            .collect();
        let index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.id.clone(), i))
            .collect();
        Self { slots, index }
    }

    fn slot(&self, backend_id: &str) -> Result<&Slot, UnknownBackend> {
        self.index
            .get(backend_id)
            .map(|&i| &self.slots[i])
            .ok_or_else(|| UnknownBackend(backend_id.to_string()))
    }

    /// Add `amount` to the backend's load, clamped at 100. Returns the
    /// new load.
    pub fn increment_load(&self, backend_id: &str, amount: u32) -> Result<u32, UnknownBackend> {
        let load = self
            .slot(backend_id)?
            .update_load(|v| (v + amount).min(MAX_LOAD));
        tracing::trace!(backend = backend_id, load, "load incremented");
        Ok(load)
    }

    /// Subtract `amount` from the backend's load, floored at 0. Returns
    /// the new load.
    pub fn decrement_load(&self, backend_id: &str, amount: u32) -> Result<u32, UnknownBackend> {
        let load = self
            .slot(backend_id)?
            .update_load(|v| v.saturating_sub(amount));
        tracing::trace!(backend = backend_id, load, "load decremented");
        Ok(load)
    }

    /// Current load for a single backend.
    pub fn load(&self, backend_id: &str) -> Result<u32, UnknownBackend> {
        Ok(self.slot(backend_id)?.load.load(Ordering::Relaxed))
    }

    pub fn contains(&self, backend_id: &str) -> bool {
        self.index.contains_key(backend_id)
    }

    /// Value copies of all backends, in registration order.
    pub fn snapshot(&self) -> Vec<Backend> {
        self.slots
            .iter()
            .map(|slot| Backend {
                id: slot.id.clone(),
                name: slot.name.clone(),
                load: slot.load.load(Ordering::Relaxed),
                health: slot.health,
            })
            .collect()
    }

    /// Zero all loads. Only the engine's reset path calls this.
    pub(crate) fn reset_loads(&self) {
        for slot in &self.slots {
            slot.load.store(0, Ordering::Relaxed);
        }
    }
}
