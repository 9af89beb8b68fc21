//! # Persistence
//!
//! 持久化模块。
//!
//! 负责：
//! - 有界持久队列 (`FileQueue` / `MemoryQueue`)
//! - 远端存储 (`LogStore` / `FileStore` / `MemoryStore`)
//! - 会话写入与过期回退 (`SessionPersister`)
//! - 后台定位中继 (`BackgroundRelay`)

pub mod codec;
pub mod error;
pub mod metrics;
pub mod persister;
pub mod queue;
pub mod relay;
pub mod stores;

pub use codec::RecordCodec;
pub use contracts::{DurableQueue, PersistOutcome, RemoteStore};
pub use error::PersistenceError;
pub use metrics::{PersistMetrics, PersistSnapshot};
pub use persister::{RetryReport, SessionPersister};
pub use queue::{open_queue, FileQueue, MemoryQueue};
pub use relay::BackgroundRelay;
pub use stores::{create_store, ConfiguredStore, FileStore, FileStoreConfig, LogStore, MemoryStore};
