//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Neither a replay file nor a simulated track was requested
    #[error("No fix source: pass --replay <track.jsonl> or --simulate <points>")]
    NoFixSource,

    /// Activity could not be saved and was not queued
    #[error("Activity '{session_id}' was not saved: {reason}")]
    SaveFailed { session_id: String, reason: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn save_failed(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SaveFailed {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }
}
