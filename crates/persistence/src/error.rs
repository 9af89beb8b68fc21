//! Persistence error types

use thiserror::Error;

/// Persistence-specific errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Store creation error
    #[error("failed to create store '{name}': {message}")]
    StoreCreation { name: String, message: String },

    /// Record could not be encoded or decoded
    #[error("codec error: {message}")]
    Codec { message: String },

    /// Durable queue failure
    #[error("queue error: {0}")]
    Queue(#[from] contracts::QueueError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersistenceError {
    /// Create a store creation error
    pub fn store_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a codec error
    pub fn codec(message: impl ToString) -> Self {
        Self::Codec {
            message: message.to_string(),
        }
    }
}

impl From<PersistenceError> for contracts::TrackerError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Io(io) => Self::Io(io),
            PersistenceError::Codec { message } => Self::Serialization(message),
            other => Self::Other(other.to_string()),
        }
    }
}
