//! BackgroundRelay - durable handoff of fixes delivered while backgrounded
//!
//! The background callback may run outside the controller task, so it only
//! appends to the durable queue. The controller drains it on return to
//! foreground and feeds the fixes through the normal pipeline.

use std::sync::Arc;

use contracts::{DurableQueue, FixCallback, LocationSample};
use tracing::{debug, error, warn};

use crate::codec::RecordCodec;
use crate::error::PersistenceError;

#[derive(Clone)]
pub struct BackgroundRelay {
    queue: Arc<dyn DurableQueue>,
    codec: RecordCodec,
}

impl BackgroundRelay {
    pub fn new(queue: Arc<dyn DurableQueue>, codec: RecordCodec) -> Self {
        Self { queue, codec }
    }

    /// Append a fix; at capacity the oldest one is evicted
    pub fn record(&self, sample: &LocationSample) -> Result<(), PersistenceError> {
        let record = self.codec.encode(sample)?;
        self.queue.enqueue(record)?;
        observability::record_relay_depth(self.queue.len());
        Ok(())
    }

    /// Remove every queued fix and return them ordered by timestamp
    ///
    /// Undecodable entries are skipped. Draining an empty relay is a no-op.
    pub fn drain_sorted(&self) -> Result<Vec<LocationSample>, PersistenceError> {
        let records = self.queue.drain_all()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut fixes = Vec::with_capacity(records.len());
        for record in &records {
            match self.codec.decode::<LocationSample>(record) {
                Ok(fix) => fixes.push(fix),
                Err(e) => warn!(error = %e, "skipping undecodable relay entry"),
            }
        }
        // stable: equal timestamps keep arrival order
        fixes.sort_by_key(|f| f.timestamp_ms);

        observability::record_relay_depth(0);
        debug!(drained = fixes.len(), skipped = records.len() - fixes.len(), "relay drained");
        Ok(fixes)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Drop stale entries left by an earlier session
    pub fn clear(&self) -> Result<(), PersistenceError> {
        let stale = self.queue.len();
        self.queue.clear()?;
        if stale > 0 {
            debug!(stale, "relay cleared");
        }
        observability::record_relay_depth(0);
        Ok(())
    }

    /// Callback suitable for background delivery
    pub fn callback(&self) -> FixCallback {
        let relay = self.clone();
        Arc::new(move |sample: LocationSample| {
            if let Err(e) = relay.record(&sample) {
                error!(error = %e, timestamp_ms = sample.timestamp_ms, "failed to relay background fix");
            }
        })
    }
}
