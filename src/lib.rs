//! Gateway pipeline simulation library.
//!
//! A deterministic model of an API-gateway request pipeline: route
//! matching with ordered predicates, rate-limit and cache gating,
//! backend load accounting, and timed lifecycle transitions for
//! in-flight requests, with aggregate statistics throughout.
//!
//! # Architecture Overview
//!
//! ```text
//! ticker ──▶ engine.admit ──▶ routing (first-match-wins)
//!                  │                 │
//!                  ▼                 ▼
//!            gate decisions    backend registry (load ±)
//!                  │                 │
//!                  ▼                 ▼
//!            timed transitions ──▶ stats
//!                  │
//!                  ▼
//!            snapshot (requests + backends + stats)
//! ```
//!
//! The presentation layer is an external collaborator: it reads
//! snapshots and issues start/stop/reset, nothing more.

// Core subsystems
pub mod config;
pub mod routing;

// Traffic state
pub mod backend;
pub mod engine;
pub mod stats;

pub use config::{ConfigError, SimConfig};
pub use engine::{AdmitError, Engine, EngineSnapshot};
