//! MemoryStore - in-process store with scripted failures

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ActivitySession, RecordId, RemoteStore, StoreError};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    sessions: Vec<ActivitySession>,
    scripted: VecDeque<StoreError>,
    fail_always: Option<StoreError>,
    attempts: usize,
}

/// Cloneable handle; clones share the same state
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next persist call with `err`; calls queue in order
    pub fn fail_next(&self, err: StoreError) {
        self.lock().scripted.push_back(err);
    }

    /// Fail every call until [`recover`](Self::recover)
    pub fn fail_always(&self, err: StoreError) {
        self.lock().fail_always = Some(err);
    }

    pub fn recover(&self) {
        let mut state = self.lock();
        state.fail_always = None;
        state.scripted.clear();
    }

    /// Sessions accepted so far
    pub fn sessions(&self) -> Vec<ActivitySession> {
        self.lock().sessions.clone()
    }

    /// Persist calls made, successful or not
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }
}

impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn persist(&mut self, session: &ActivitySession) -> Result<RecordId, StoreError> {
        let mut state = self.lock();
        state.attempts += 1;

        if let Some(err) = state.scripted.pop_front() {
            return Err(err);
        }
        if let Some(err) = &state.fail_always {
            return Err(err.clone());
        }

        state.sessions.push(session.clone());
        debug!(store = %self.name, session = %session.id, "session stored");
        Ok(session.id.clone())
    }
}
