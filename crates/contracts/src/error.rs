//! Layered error definitions
//!
//! Categorized by source: permission / location / lifecycle / persistence / config

use thiserror::Error;

use crate::ActivitySession;

/// Unified error type
#[derive(Debug, Error)]
pub enum TrackerError {
    // ===== Permission Errors =====
    /// User declined location access
    #[error("location permission denied")]
    PermissionDenied,

    // ===== Location Errors =====
    /// No fix obtainable within the bounded attempt
    #[error("location unavailable after {waited_ms}ms: {message}")]
    LocationUnavailable { waited_ms: u64, message: String },

    /// Provider refused to deliver updates
    #[error("location provider error: {message}")]
    Provider { message: String },

    // ===== Lifecycle Errors =====
    /// Operation not permitted in the current state
    #[error("'{operation}' is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// A session is already tracking or paused
    #[error("a tracking session is already active")]
    AlreadyActive,

    /// Controller task has exited
    #[error("session controller is closed")]
    ControllerClosed,

    // ===== Persistence Errors =====
    /// Remote write failed with no automatic recovery
    #[error("failed to save activity '{}': {reason}", session.id)]
    SaveFailed {
        reason: String,
        session: Box<ActivitySession>,
    },

    /// Session record violates its invariants
    #[error("invalid session at '{field}': {message}")]
    InvalidSession { field: String, message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encode/decode error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TrackerError {
    /// Create location unavailable error
    pub fn location_unavailable(waited_ms: u64, message: impl Into<String>) -> Self {
        Self::LocationUnavailable {
            waited_ms,
            message: message.into(),
        }
    }

    /// Create provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create invalid state error
    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Create save failed error, keeping the unsaved session
    pub fn save_failed(reason: impl Into<String>, session: ActivitySession) -> Self {
        Self::SaveFailed {
            reason: reason.into(),
            session: Box::new(session),
        }
    }

    /// Create invalid session error
    pub fn invalid_session(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSession {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LocationUnavailable { .. } | Self::PermissionDenied | Self::Provider { .. }
        )
    }
}

/// Remote store failure, classified for fallback routing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Remote session/token is invalid or expired
    #[error("remote session expired: {message}")]
    Expired { message: String },

    /// Remote rejected the record
    #[error("record rejected: {message}")]
    Rejected { message: String },

    /// Remote could not be reached
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Local fallback queue failed
    #[error("local queue error: {message}")]
    LocalQueue { message: String },

    /// IO error while writing
    #[error("store io error: {message}")]
    Io { message: String },
}

impl StoreError {
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn local_queue(message: impl Into<String>) -> Self {
        Self::LocalQueue {
            message: message.into(),
        }
    }

    /// Expired-session failures are recovered through the pending queue
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

/// Durable queue failure
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue file corrupt at byte {offset}: {message}")]
    Corrupt { offset: u64, message: String },

    #[error("record of {len} bytes exceeds frame limit")]
    RecordTooLarge { len: usize },

    #[error("queue capacity must be > 0")]
    InvalidCapacity,
}
