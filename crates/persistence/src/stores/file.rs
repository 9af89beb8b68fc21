//! FileStore - one JSON document per session

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{ActivitySession, RecordId, RemoteStore, StoreError};
use tracing::{debug, error, instrument};

use crate::error::PersistenceError;

/// Configuration for FileStore
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// Pretty-print documents
    pub pretty: bool,
}

impl FileStoreConfig {
    /// Create config from params map
    ///
    /// `base_path` is required; `pretty` defaults to false.
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, PersistenceError> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .ok_or_else(|| PersistenceError::store_creation(name, "missing param 'base_path'"))?;
        let pretty = params.get("pretty").is_some_and(|v| v == "true");
        Ok(Self { base_path, pretty })
    }
}

/// Store that writes sessions to disk
pub struct FileStore {
    name: String,
    config: FileStoreConfig,
}

impl FileStore {
    pub fn new(name: impl Into<String>, config: FileStoreConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        Ok(Self {
            name: name.into(),
            config,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, PersistenceError> {
        let name = name.into();
        let config = FileStoreConfig::from_params(&name, params)?;
        Ok(Self::new(name, config)?)
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Path of the document for `record_id`
    pub fn document_path(&self, record_id: &str) -> PathBuf {
        self.config.base_path.join(format!("{record_id}.json"))
    }

    fn write_document(&self, session: &ActivitySession) -> std::io::Result<PathBuf> {
        let path = self.document_path(&session.id);
        let tmp = path.with_extension("json.tmp");

        let mut file = File::create(&tmp)?;
        if self.config.pretty {
            serde_json::to_writer_pretty(&mut file, session)
        } else {
            serde_json::to_writer(&mut file, session)
        }
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        file.flush()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

impl RemoteStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_store_persist",
        skip(self, session),
        fields(store = %self.name, session = %session.id)
    )]
    async fn persist(&mut self, session: &ActivitySession) -> Result<RecordId, StoreError> {
        session
            .validate()
            .map_err(|e| StoreError::rejected(e.to_string()))?;

        let path = self.write_document(session).map_err(|e| {
            error!(store = %self.name, error = %e, "write failed");
            StoreError::from(e)
        })?;
        debug!(path = %path.display(), "session document written");
        Ok(session.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::{ActivityKind, ManualEntry};
    use tempfile::tempdir;

    fn session() -> ActivitySession {
        ActivitySession::manual(ManualEntry {
            kind: ActivityKind::Walk,
            name: "Lunch loop".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            duration_s: 1800,
            distance_m: 2500.0,
            activity_date: None,
            notes: String::new(),
            photos: vec![],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_file_store_writes_document() {
        let dir = tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert(
            "base_path".to_string(),
            dir.path().to_string_lossy().into_owned(),
        );
        let mut store = FileStore::from_params("disk", &params).unwrap();

        let s = session();
        let id = store.persist(&s).await.unwrap();
        assert_eq!(id, s.id);

        let text = fs::read_to_string(store.document_path(&id)).unwrap();
        let back: ActivitySession = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_missing_base_path() {
        let err = FileStore::from_params("disk", &HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, PersistenceError::StoreCreation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_session_rejected() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(
            "disk",
            FileStoreConfig {
                base_path: dir.path().to_path_buf(),
                pretty: true,
            },
        )
        .unwrap();

        let mut s = session();
        s.distance_m = -1.0;
        let err = store.persist(&s).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
    }
}
