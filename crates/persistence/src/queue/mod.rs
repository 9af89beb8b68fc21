//! Durable queue implementations

mod file;
mod memory;

pub use file::FileQueue;
pub use memory::MemoryQueue;

use std::sync::Arc;

use contracts::{DurableQueue, QueueConfig};

use crate::error::PersistenceError;

/// Open the file-backed queue described by `config`
pub fn open_queue(config: &QueueConfig) -> Result<Arc<dyn DurableQueue>, PersistenceError> {
    let queue = FileQueue::open(&config.path, config.capacity)?;
    Ok(Arc::new(queue))
}
