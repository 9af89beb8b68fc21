//! Remote store implementations

mod file;
mod log;
mod memory;

pub use file::{FileStore, FileStoreConfig};
pub use log::LogStore;
pub use memory::MemoryStore;

use contracts::{ActivitySession, RecordId, RemoteStore, StoreConfig, StoreError, StoreType};

use crate::error::PersistenceError;

/// Store selected by configuration
pub enum ConfiguredStore {
    Log(LogStore),
    File(FileStore),
    Memory(MemoryStore),
}

impl RemoteStore for ConfiguredStore {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
            Self::Memory(s) => s.name(),
        }
    }

    async fn persist(&mut self, session: &ActivitySession) -> Result<RecordId, StoreError> {
        match self {
            Self::Log(s) => s.persist(session).await,
            Self::File(s) => s.persist(session).await,
            Self::Memory(s) => s.persist(session).await,
        }
    }
}

/// Create the store described by `config`
pub fn create_store(config: &StoreConfig) -> Result<ConfiguredStore, PersistenceError> {
    let store = match config.store_type {
        StoreType::Log => ConfiguredStore::Log(LogStore::new(&config.name)),
        StoreType::File => {
            ConfiguredStore::File(FileStore::from_params(&config.name, &config.params)?)
        }
        StoreType::Memory => ConfiguredStore::Memory(MemoryStore::new(&config.name)),
    };
    tracing::info!(store = %config.name, store_type = ?config.store_type, "store created");
    Ok(store)
}
