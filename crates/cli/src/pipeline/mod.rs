//! Tracking run orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{build_persister, FixSource, TrackingConfig, TrackingRun};
pub use stats::RunStats;
