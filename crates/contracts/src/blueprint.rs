//! TrackerBlueprint - Config Loader output
//!
//! Full runtime configuration: filter thresholds, route bounds, location
//! settings, controller timing, local queues and the remote store.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{EngineConfig, FilterConfig, RouteBufferConfig};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackerBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sample filter thresholds
    #[serde(default)]
    #[validate(nested)]
    pub filter: FilterConfig,

    /// Route buffer bounds
    #[serde(default)]
    #[validate(nested)]
    pub route: RouteBufferConfig,

    /// Location provider settings
    #[serde(default)]
    #[validate(nested)]
    pub location: LocationSettings,

    /// Controller timing and channel sizes
    #[serde(default)]
    #[validate(nested)]
    pub controller: ControllerConfig,

    /// Background relay queue
    #[serde(default = "QueueConfig::relay")]
    #[validate(nested)]
    pub relay: QueueConfig,

    /// Pending-write queue
    #[serde(default = "QueueConfig::pending")]
    #[validate(nested)]
    pub pending: QueueConfig,

    /// Remote store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,
}

impl Default for TrackerBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::default(),
            filter: FilterConfig::default(),
            route: RouteBufferConfig::default(),
            location: LocationSettings::default(),
            controller: ControllerConfig::default(),
            relay: QueueConfig::relay(),
            pending: QueueConfig::pending(),
            store: StoreConfig::default(),
        }
    }
}

impl TrackerBlueprint {
    /// Engine-facing subset of the configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            filter: self.filter.clone(),
            route: self.route.clone(),
        }
    }
}

/// Provider accuracy tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    /// Best available, navigation grade
    BestForNavigation,
    #[default]
    High,
    Balanced,
    Low,
}

/// Location provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LocationSettings {
    #[serde(default)]
    pub accuracy: AccuracyTier,

    /// Minimum time between updates (ms)
    #[serde(default = "default_time_interval_ms")]
    #[validate(range(min = 1))]
    pub time_interval_ms: u64,

    /// Minimum displacement between updates (m)
    #[serde(default = "default_distance_interval_m")]
    #[validate(range(min = 0.0))]
    pub distance_interval_m: f64,

    /// Bound on the initial fix acquisition in `start()` (ms)
    #[serde(default = "default_fix_timeout_ms")]
    #[validate(range(min = 1))]
    pub fix_timeout_ms: u64,
}

fn default_time_interval_ms() -> u64 {
    1000
}

fn default_distance_interval_m() -> f64 {
    1.0
}

fn default_fix_timeout_ms() -> u64 {
    15_000
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::default(),
            time_interval_ms: default_time_interval_ms(),
            distance_interval_m: default_distance_interval_m(),
            fix_timeout_ms: default_fix_timeout_ms(),
        }
    }
}

impl LocationSettings {
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }
}

/// Controller timing and channel sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ControllerConfig {
    /// Duration/status tick period (ms)
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 10))]
    pub tick_interval_ms: u64,

    /// Seconds without a fix before the signal is reported stale
    #[serde(default = "default_stale_after_s")]
    #[validate(range(min = 1))]
    pub stale_after_s: u64,

    /// Command channel capacity
    #[serde(default = "default_command_capacity")]
    #[validate(range(min = 1))]
    pub command_capacity: usize,

    /// Foreground fix channel capacity
    #[serde(default = "default_fix_capacity")]
    #[validate(range(min = 1))]
    pub fix_capacity: usize,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_stale_after_s() -> u64 {
    60
}

fn default_command_capacity() -> usize {
    32
}

fn default_fix_capacity() -> usize {
    256
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stale_after_s: default_stale_after_s(),
            command_capacity: default_command_capacity(),
            fix_capacity: default_fix_capacity(),
        }
    }
}

impl ControllerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_s)
    }
}

/// Record encoding used in durable queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    #[default]
    Json,
    Bincode,
}

/// Durable queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    /// Backing file
    #[validate(length(min = 1))]
    pub path: String,

    /// Maximum retained records (oldest evicted)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 100_000))]
    pub capacity: usize,

    #[serde(default)]
    pub format: RecordFormat,
}

fn default_queue_capacity() -> usize {
    500
}

impl QueueConfig {
    pub fn relay() -> Self {
        Self {
            path: "data/relay.queue".to_string(),
            capacity: default_queue_capacity(),
            format: RecordFormat::Json,
        }
    }

    pub fn pending() -> Self {
        Self {
            path: "data/pending.queue".to_string(),
            capacity: default_queue_capacity(),
            format: RecordFormat::Json,
        }
    }
}

/// Remote store type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Logs sessions, accepts everything
    #[default]
    Log,
    /// One JSON document per session
    File,
    /// In-process store
    Memory,
}

/// Remote store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub store_type: StoreType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "log".to_string(),
            store_type: StoreType::Log,
            params: HashMap::new(),
        }
    }
}
