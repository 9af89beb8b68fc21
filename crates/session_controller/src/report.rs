//! Results returned by controller operations

use contracts::{ActivitySession, PersistOutcome};
use serde::Serialize;

/// Finished session and where it ended up
#[derive(Debug, Clone, PartialEq)]
pub struct StopReport {
    pub session: ActivitySession,
    /// `Persisted` or `QueuedForRetry`; failures surface as errors
    pub outcome: PersistOutcome,
}

impl StopReport {
    /// Record id assigned by the store, if it accepted the session
    pub fn record_id(&self) -> Option<&str> {
        match &self.outcome {
            PersistOutcome::Persisted(id) => Some(id),
            _ => None,
        }
    }
}

/// Background fixes absorbed on return to foreground
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Fixes read from the relay
    pub drained: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Fixes dropped because the session was paused
    pub ignored: usize,
}
