//! LogStore - logs session summaries via tracing

use contracts::{ActivitySession, RecordId, RemoteStore, StoreError};
use tracing::{info, instrument};

/// Store that accepts every session and logs it
pub struct LogStore {
    name: String,
    next_seq: u64,
}

impl LogStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_seq: 1,
        }
    }
}

impl RemoteStore for LogStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_store_persist",
        skip(self, session),
        fields(store = %self.name, session = %session.id)
    )]
    async fn persist(&mut self, session: &ActivitySession) -> Result<RecordId, StoreError> {
        let record_id = format!("{}-{:06}", self.name, self.next_seq);
        self.next_seq += 1;

        info!(
            store = %self.name,
            record_id = %record_id,
            kind = %session.kind,
            name = %session.name,
            duration_s = session.duration_s,
            distance_m = session.distance_m,
            route_points = session.route.len(),
            manual = session.manual_entry,
            "activity saved"
        );
        Ok(record_id)
    }
}
