//! Location data types
//!
//! Raw fixes from the device and the accepted points derived from them.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoord {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Single raw fix reported by the positioning subsystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Wall clock, milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius (meters)
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Device-reported instantaneous speed (m/s)
    #[serde(default)]
    pub speed_mps: Option<f64>,
}

impl LocationSample {
    /// Fix with only position and time
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            altitude: None,
            accuracy_m: None,
            speed_mps: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn coord(&self) -> GeoCoord {
        GeoCoord::new(self.latitude, self.longitude)
    }
}

/// Accepted point of a route
///
/// Sequences of route points are non-decreasing in `timestamp_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub altitude: Option<f64>,
    pub accuracy_m: Option<f64>,
}

impl RoutePoint {
    pub fn coord(&self) -> GeoCoord {
        GeoCoord::new(self.latitude, self.longitude)
    }
}

impl From<&LocationSample> for RoutePoint {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp_ms: sample.timestamp_ms,
            altitude: sample.altitude,
            accuracy_m: sample.accuracy_m,
        }
    }
}

/// How the platform delivers updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// App in foreground, fixes flow straight to the controller
    Foreground,
    /// App suspended, fixes go to the background relay
    Background,
}

/// Location permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// User has not been asked yet
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}
