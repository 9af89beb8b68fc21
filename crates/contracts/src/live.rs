//! Live metrics exposed to callers while a session runs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ActivityKind;

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Idle,
    Tracking,
    Paused,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Tracking => "tracking",
            Self::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Coarse signal health while tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Fixes arriving recently
    Active,
    /// Subscribed, no fix yet
    Searching,
    /// No fix for longer than the stale threshold
    Stale,
    /// Provider failed to deliver
    Error,
}

impl SignalStatus {
    /// Numeric code for gauges
    pub fn code(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Searching => 1,
            Self::Stale => 2,
            Self::Error => 3,
        }
    }
}

/// Snapshot published on every fix, tick and lifecycle change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub state: TrackingState,
    pub kind: Option<ActivityKind>,
    pub route_points: usize,
    pub distance_m: f64,
    pub elapsed_s: f64,
    pub current_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub average_speed_kmh: f64,
    /// `None` outside of `Tracking`
    pub status: Option<SignalStatus>,
    pub backgrounded: bool,
}
