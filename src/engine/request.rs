//! In-flight request representation.

use serde::Serialize;

use crate::config::Method;

/// Monotonically increasing request identifier, unique per engine.
pub type RequestId = u64;

/// Lifecycle state of a simulated request.
///
/// `RateLimited` and `Cached` are short-circuit outcomes that skip
/// `Processing`; all three terminal states linger before retirement so
/// observers can see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestState {
    Admitted,
    RateLimited,
    Cached,
    Processing,
    Completed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::RateLimited | RequestState::Cached | RequestState::Completed
        )
    }
}

/// A request tracked by the engine. Observers only ever see value
/// copies of this.
#[derive(Debug, Clone, Serialize)]
pub struct InFlightRequest {
    pub id: RequestId,
    pub route_id: String,
    pub method: Method,
    pub backend_id: String,
    pub state: RequestState,
    /// Milliseconds since the engine was created.
    pub enqueued_at: u64,
    /// Completion percentage in [0, 100]; only advances in `Processing`
    /// and jumps to 100 on completion.
    pub progress: u8,
}
