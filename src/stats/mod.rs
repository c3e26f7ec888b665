//! Aggregate request statistics.
//!
//! # Responsibilities
//! - Count terminal outcomes driven by engine transition events
//! - Serve consistent snapshots to observers
//!
//! # Design Decisions
//! - Counters are monotone for the lifetime of a run; only an explicit
//!   reset zeroes them
//! - A single mutex keeps reset atomic with respect to concurrent reads
//! - `total != success + rate_limited` in general: success counts
//!   cached outcomes too, and both exclude rate-limited ones

use std::sync::Mutex;
use serde::Serialize;

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: u64,
    pub success: u64,
    pub cached: u64,
    pub rate_limited: u64,
}

/// A terminal outcome reported by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    /// A forwarded request finished processing.
    Completed,
    /// A cache-eligible request was served from cache.
    CacheHit,
    /// An admission was rejected by the rate limiter.
    RateLimited,
}

/// Running counters derived from engine events.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Stats>,
}

impl StatsAggregator {
    /// Record one terminal outcome. Every event counts toward `total`.
    pub fn record(&self, event: StatsEvent) {
        let mut stats = self.inner.lock().expect("stats mutex poisoned");
        stats.total += 1;
        match event {
            StatsEvent::Completed => stats.success += 1,
            StatsEvent::CacheHit => {
                stats.success += 1;
                stats.cached += 1;
            }
            StatsEvent::RateLimited => stats.rate_limited += 1,
        }
    }

    /// Zero all counters.
    pub fn reset(&self) {
        *self.inner.lock().expect("stats mutex poisoned") = Stats::default();
    }

    pub fn snapshot(&self) -> Stats {
        *self.inner.lock().expect("stats mutex poisoned")
    }
}
