//! Track engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Track engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sample filter thresholds
    #[serde(default)]
    pub filter: FilterConfig,

    /// Route buffer bounds
    #[serde(default)]
    pub route: RouteBufferConfig,
}

/// Sample filter thresholds
///
/// Empirical constants tuned for mixed foot/bike activities; kept
/// overridable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FilterConfig {
    /// Fixes with a coarser reported accuracy are noise (m)
    #[serde(default = "default_max_accuracy_m")]
    #[validate(range(exclusive_min = 0.0))]
    pub max_accuracy_m: f64,

    /// Movement below this is stationary jitter (m)
    #[serde(default = "default_min_movement_m")]
    #[validate(range(min = 0.0))]
    pub min_movement_m: f64,

    /// Movement above this is a GPS jump (m)
    #[serde(default = "default_max_jump_m")]
    #[validate(range(exclusive_min = 0.0))]
    pub max_jump_m: f64,

    /// Derived speeds at or above this are unreliable (km/h)
    #[serde(default = "default_max_plausible_speed_kmh")]
    #[validate(range(exclusive_min = 0.0))]
    pub max_plausible_speed_kmh: f64,
}

fn default_max_accuracy_m() -> f64 {
    50.0
}

fn default_min_movement_m() -> f64 {
    1.0
}

fn default_max_jump_m() -> f64 {
    1000.0
}

fn default_max_plausible_speed_kmh() -> f64 {
    200.0
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: default_max_accuracy_m(),
            min_movement_m: default_min_movement_m(),
            max_jump_m: default_max_jump_m(),
            max_plausible_speed_kmh: default_max_plausible_speed_kmh(),
        }
    }
}

/// Route buffer bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RouteBufferConfig {
    /// Maximum points held live
    #[serde(default = "default_max_points")]
    #[validate(range(min = 4))]
    pub max_points: usize,

    /// Most recent points kept at full resolution on compaction
    #[serde(default = "default_recent_points")]
    #[validate(range(min = 1))]
    pub recent_points: usize,
}

fn default_max_points() -> usize {
    1000
}

fn default_recent_points() -> usize {
    100
}

impl Default for RouteBufferConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            recent_points: default_recent_points(),
        }
    }
}
