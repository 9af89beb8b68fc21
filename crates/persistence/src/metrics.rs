//! Persistence counters for run summaries

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a persister
#[derive(Debug, Default)]
pub struct PersistMetrics {
    persisted: AtomicU64,
    queued: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    discarded: AtomicU64,
}

impl PersistMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PersistSnapshot {
        PersistSnapshot {
            persisted: self.persisted.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of persister counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSnapshot {
    /// Writes accepted by the store, including retries
    pub persisted: u64,
    /// Writes spooled to the pending queue
    pub queued: u64,
    pub failed: u64,
    /// Pending writes re-attempted
    pub retried: u64,
    /// Undecodable pending records dropped
    pub discarded: u64,
}
