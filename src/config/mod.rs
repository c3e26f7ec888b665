//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs (parse)
//!     → validation.rs (semantic checks, all errors collected)
//!     → SimConfig accepted by the engine
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, GateConfig, Health, Method, PredicateConfig, RouteConfig, SimConfig,
    TimingConfig,
};
pub use validation::{validate_config, ValidationError};
