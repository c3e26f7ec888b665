//! Route matching subsystem.
//!
//! # Data Flow
//! ```text
//! Admission context → table.rs (ordered scan)
//!     → predicate.rs (AND over the route's predicate set)
//!     → first fully-matching Route, or explicit no-match
//! ```

pub mod predicate;
pub mod table;

pub use predicate::{MatchContext, Predicate};
pub use table::{Route, RouteTable};
