//! SessionPersister - remote write with local pending-queue fallback

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    ActivitySession, DurableQueue, PendingWrite, PersistOutcome, RemoteStore, StoreError,
};
use tracing::{error, info, instrument, warn};

use crate::codec::RecordCodec;
use crate::error::PersistenceError;
use crate::metrics::PersistMetrics;

/// Result of a retry pass over the pending queue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryReport {
    /// Record ids of writes that went through
    pub persisted: Vec<String>,
    /// Writes that failed again and were queued back
    pub requeued: usize,
    /// Records that could not be decoded
    pub discarded: usize,
}

/// Hands finished sessions to a remote store
///
/// Expired-session failures are spooled to the pending queue as
/// [`PendingWrite`] records; anything else surfaces as `Failed`.
pub struct SessionPersister<S> {
    store: S,
    pending: Arc<dyn DurableQueue>,
    codec: RecordCodec,
    metrics: Arc<PersistMetrics>,
}

impl<S: RemoteStore> SessionPersister<S> {
    pub fn new(store: S, pending: Arc<dyn DurableQueue>, codec: RecordCodec) -> Self {
        observability::record_pending_depth(pending.len());
        Self {
            store,
            pending,
            codec,
            metrics: Arc::new(PersistMetrics::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<PersistMetrics> {
        &self.metrics
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[instrument(
        name = "session_persist",
        skip(self, session),
        fields(store = %self.store.name(), session = %session.id)
    )]
    pub async fn persist(&mut self, session: &ActivitySession) -> PersistOutcome {
        let started = Instant::now();
        let result = self.store.persist(session).await;
        observability::record_persist_latency_ms(
            self.store.name(),
            started.elapsed().as_secs_f64() * 1000.0,
        );

        match result {
            Ok(record_id) => {
                self.metrics.inc_persisted();
                info!(record_id = %record_id, "session persisted");
                PersistOutcome::Persisted(record_id)
            }
            Err(e) if e.is_expired() => {
                let reason = e.to_string();
                match self.enqueue(&PendingWrite::new(session.clone(), reason.clone())) {
                    Ok(()) => {
                        self.metrics.inc_queued();
                        warn!(reason = %reason, pending = self.pending.len(), "session queued for retry");
                        PersistOutcome::QueuedForRetry { reason }
                    }
                    Err(qe) => {
                        self.metrics.inc_failed();
                        error!(error = %qe, "pending queue unavailable");
                        PersistOutcome::Failed(StoreError::local_queue(qe.to_string()))
                    }
                }
            }
            Err(e) => {
                self.metrics.inc_failed();
                error!(error = %e, "session persist failed");
                PersistOutcome::Failed(e)
            }
        }
    }

    /// Re-attempt every pending write once
    ///
    /// Works on a snapshot and settles one record at a time: the record
    /// stays at the head of the queue until its attempt is decided, then is
    /// removed (persisted or undecodable) or swapped for a copy with
    /// `attempts + 1` at the tail. A crash mid-pass loses nothing.
    #[instrument(name = "session_retry_pending", skip(self), fields(store = %self.store.name()))]
    pub async fn retry_pending(&mut self) -> Result<RetryReport, PersistenceError> {
        let records = self.pending.peek_all()?;
        let mut report = RetryReport::default();

        for record in records {
            let mut write: PendingWrite = match self.codec.decode(&record) {
                Ok(write) => write,
                Err(e) => {
                    warn!(error = %e, "undecodable pending record dropped");
                    self.pending.replace_front(1, Vec::new())?;
                    self.metrics.inc_discarded();
                    report.discarded += 1;
                    continue;
                }
            };

            self.metrics.inc_retried();
            match self.store.persist(&write.session).await {
                Ok(record_id) => {
                    self.pending.replace_front(1, Vec::new())?;
                    self.metrics.inc_persisted();
                    info!(session = %write.session.id, record_id = %record_id, attempts = write.attempts + 1, "pending write persisted");
                    report.persisted.push(record_id);
                }
                Err(e) => {
                    write.attempts += 1;
                    write.last_error = e.to_string();
                    match self.codec.encode(&write) {
                        Ok(updated) => {
                            self.pending.replace_front(1, vec![updated])?;
                            report.requeued += 1;
                        }
                        Err(ce) => {
                            // Keep the original record rather than lose the session
                            error!(session = %write.session.id, error = %ce, "failed to re-encode pending write");
                            self.pending.replace_front(1, vec![record])?;
                            report.requeued += 1;
                        }
                    }
                }
            }
        }

        observability::record_pending_depth(self.pending.len());
        observability::record_retry(report.persisted.len(), report.requeued, report.discarded);
        Ok(report)
    }

    /// Queued writes, oldest first, left in place
    pub fn pending(&self) -> Result<Vec<PendingWrite>, PersistenceError> {
        let mut writes = Vec::new();
        for record in self.pending.peek_all()? {
            match self.codec.decode(&record) {
                Ok(write) => writes.push(write),
                Err(e) => warn!(error = %e, "skipping undecodable pending record"),
            }
        }
        Ok(writes)
    }

    fn enqueue(&self, write: &PendingWrite) -> Result<(), PersistenceError> {
        let record = self.codec.encode(write)?;
        self.pending.enqueue(record)?;
        observability::record_pending_depth(self.pending.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{FileQueue, MemoryQueue};
    use crate::stores::MemoryStore;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use contracts::{ActivityKind, ManualEntry, RecordFormat, RecordId};
    use tempfile::tempdir;

    fn session(minute: u32) -> ActivitySession {
        ActivitySession::manual(ManualEntry {
            kind: ActivityKind::Run,
            name: String::new(),
            start_time: Utc.with_ymd_and_hms(2024, 6, 2, 7, minute, 0).unwrap(),
            duration_s: 600,
            distance_m: 2000.0,
            activity_date: None,
            notes: String::new(),
            photos: vec![],
        })
        .unwrap()
    }

    fn persister(store: MemoryStore) -> SessionPersister<MemoryStore> {
        SessionPersister::new(
            store,
            Arc::new(MemoryQueue::new(8).unwrap()),
            RecordCodec::default(),
        )
    }

    #[tokio::test]
    async fn test_persisted() {
        let store = MemoryStore::new("mem");
        let mut p = persister(store.clone());
        let s = session(0);

        let outcome = p.persist(&s).await;
        assert_eq!(outcome, PersistOutcome::Persisted(s.id.clone()));
        assert_eq!(store.sessions(), vec![s]);
        assert_eq!(p.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_expired_is_queued_then_retried() {
        let store = MemoryStore::new("mem");
        store.fail_next(StoreError::expired("token expired"));
        let mut p = persister(store.clone());
        let s = session(1);

        let outcome = p.persist(&s).await;
        assert!(matches!(outcome, PersistOutcome::QueuedForRetry { .. }));
        assert!(outcome.is_durable());

        let pending = p.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].session, s);
        assert_eq!(pending[0].attempts, 1);
        assert!(store.sessions().is_empty());

        let report = p.retry_pending().await.unwrap();
        assert_eq!(report.persisted, vec![s.id.clone()]);
        assert_eq!(report.requeued, 0);
        assert_eq!(p.pending_len(), 0);
        assert_eq!(store.sessions(), vec![s]);
    }

    #[tokio::test]
    async fn test_other_failure_not_queued() {
        let store = MemoryStore::new("mem");
        store.fail_next(StoreError::unavailable("offline"));
        let mut p = persister(store);

        let outcome = p.persist(&session(2)).await;
        assert_eq!(
            outcome,
            PersistOutcome::Failed(StoreError::unavailable("offline"))
        );
        assert_eq!(p.pending_len(), 0);
        assert_eq!(p.metrics().snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_retry_requeues_with_attempts() {
        let store = MemoryStore::new("mem");
        store.fail_always(StoreError::expired("still expired"));
        let mut p = persister(store.clone());
        p.persist(&session(3)).await;

        let report = p.retry_pending().await.unwrap();
        assert!(report.persisted.is_empty());
        assert_eq!(report.requeued, 1);

        let pending = p.pending().unwrap();
        assert_eq!(pending[0].attempts, 2);
        assert!(pending[0].last_error.contains("still expired"));
        assert_eq!(store.attempts(), 2);
    }

    #[tokio::test]
    async fn test_retry_discards_garbage() {
        let queue = Arc::new(MemoryQueue::new(8).unwrap());
        queue.enqueue(Bytes::from_static(b"{broken")).unwrap();
        let mut p = SessionPersister::new(MemoryStore::new("mem"), queue, RecordCodec::default());

        let report = p.retry_pending().await.unwrap();
        assert_eq!(report.discarded, 1);
        assert_eq!(p.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_retry_keeps_order_and_unsettled_records() {
        let store = MemoryStore::new("mem");
        store.fail_next(StoreError::expired("a"));
        store.fail_next(StoreError::expired("b"));
        let mut p = persister(store.clone());
        let (first, second) = (session(5), session(6));
        p.persist(&first).await;
        p.persist(&second).await;

        // First retry attempt fails again, second goes through
        store.fail_next(StoreError::expired("again"));
        let report = p.retry_pending().await.unwrap();
        assert_eq!(report.persisted, vec![second.id.clone()]);
        assert_eq!(report.requeued, 1);

        let pending = p.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].session, first);
        assert_eq!(pending[0].attempts, 2);
    }

    /// Store whose writes never complete
    struct StalledStore;

    impl RemoteStore for StalledStore {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn persist(&mut self, _session: &ActivitySession) -> Result<RecordId, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_survives_interrupted_retry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pending.queue");
        let codec = RecordCodec::default();
        let s = session(7);
        {
            let store = MemoryStore::new("mem");
            store.fail_next(StoreError::expired("token"));
            let mut p = SessionPersister::new(
                store,
                Arc::new(FileQueue::open(&path, 4).unwrap()),
                codec,
            );
            p.persist(&s).await;
        }
        {
            // The retry is abandoned while the remote write is in flight
            let mut p = SessionPersister::new(
                StalledStore,
                Arc::new(FileQueue::open(&path, 4).unwrap()),
                codec,
            );
            let interrupted =
                tokio::time::timeout(std::time::Duration::from_secs(5), p.retry_pending()).await;
            assert!(interrupted.is_err());
        }

        let store = MemoryStore::new("mem");
        let mut p =
            SessionPersister::new(store.clone(), Arc::new(FileQueue::open(&path, 4).unwrap()), codec);
        assert_eq!(p.pending().unwrap()[0].session, s);
        let report = p.retry_pending().await.unwrap();
        assert_eq!(report.persisted, vec![s.id.clone()]);
        assert_eq!(p.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_pending_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pending.queue");
        let codec = RecordCodec::new(RecordFormat::Bincode);
        let s = session(4);
        {
            let store = MemoryStore::new("mem");
            store.fail_next(StoreError::expired("token"));
            let mut p = SessionPersister::new(
                store,
                Arc::new(FileQueue::open(&path, 4).unwrap()),
                codec,
            );
            p.persist(&s).await;
        }

        let store = MemoryStore::new("mem");
        let mut p =
            SessionPersister::new(store.clone(), Arc::new(FileQueue::open(&path, 4).unwrap()), codec);
        assert_eq!(p.pending().unwrap()[0].session, s);
        p.retry_pending().await.unwrap();
        assert_eq!(store.sessions().len(), 1);
    }
}
