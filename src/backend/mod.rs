//! Backend subsystem.

pub mod registry;

pub use registry::{Backend, BackendRegistry, UnknownBackend, MAX_LOAD};
