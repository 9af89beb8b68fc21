//! RemoteStore / DurableQueue traits - persistence boundary
//!
//! The controller hands finished sessions to a `RemoteStore`; failures
//! classified as expired are spooled into a `DurableQueue`.

use bytes::Bytes;

use crate::{ActivitySession, QueueError, RecordId, StoreError};

/// Remote store trait
///
/// All store implementations must implement this trait.
#[trait_variant::make(RemoteStore: Send)]
pub trait LocalRemoteStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist a finished session
    ///
    /// # Errors
    /// Returns a classified [`StoreError`]; `Expired` is recoverable.
    async fn persist(&mut self, session: &ActivitySession) -> Result<RecordId, StoreError>;
}

/// Durable, bounded, append-only queue of opaque records
///
/// At capacity, enqueue evicts the oldest record. Implementations must
/// survive a process restart and tolerate concurrent callers.
pub trait DurableQueue: Send + Sync {
    /// Append a record
    fn enqueue(&self, record: Bytes) -> Result<(), QueueError>;

    /// Remove and return all records, oldest first
    fn drain_all(&self) -> Result<Vec<Bytes>, QueueError>;

    /// Copy of all records, oldest first, without removing them
    fn peek_all(&self) -> Result<Vec<Bytes>, QueueError>;

    /// Atomically remove the `count` oldest records and append `records`
    ///
    /// Either the whole replacement is applied or none of it is.
    fn replace_front(&self, count: usize, records: Vec<Bytes>) -> Result<(), QueueError>;

    /// Number of queued records
    fn len(&self) -> usize;

    /// Maximum number of records retained
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record
    fn clear(&self) -> Result<(), QueueError> {
        self.drain_all().map(|_| ())
    }
}

/// Tagged result of handing a session to the persistence boundary
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// Remote store accepted the session
    Persisted(RecordId),
    /// Remote session expired; the record waits in the pending queue
    QueuedForRetry { reason: String },
    /// No automatic recovery
    Failed(StoreError),
}

impl PersistOutcome {
    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persisted(_) => "persisted",
            Self::QueuedForRetry { .. } => "queued",
            Self::Failed(_) => "failed",
        }
    }

    /// Data is safe, either remotely or in the pending queue
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}
