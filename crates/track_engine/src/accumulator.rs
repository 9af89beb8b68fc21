//! Running distance and speed totals for one session.

use crate::filter::Segment;

/// km/h per m/s
const MPS_TO_KMH: f64 = 3.6;

/// Distance / current speed / rolling max speed
#[derive(Debug, Clone, Default)]
pub struct DistanceSpeedAccumulator {
    distance_m: f64,
    current_speed_kmh: f64,
    max_speed_kmh: f64,
    max_plausible_speed_kmh: f64,
    suppressed: u64,
}

impl DistanceSpeedAccumulator {
    pub fn new(max_plausible_speed_kmh: f64) -> Self {
        Self {
            max_plausible_speed_kmh,
            ..Default::default()
        }
    }

    /// Fold an accepted transition into the totals
    ///
    /// Distance always counts. A suppressed speed leaves current and max
    /// speed untouched.
    pub fn record(&mut self, segment: &Segment) {
        self.distance_m += segment.distance_m;
        match segment.reliable_speed_kmh() {
            Some(speed) => {
                self.current_speed_kmh = speed;
                self.observe_max(speed);
            }
            None if segment.speed_suppressed => self.suppressed += 1,
            None => {}
        }
    }

    /// Fold a device-reported speed (m/s) into the max
    ///
    /// Negative (platform "unknown"), non-finite and implausible values are
    /// ignored.
    pub fn observe_device_speed(&mut self, speed_mps: f64) {
        if !speed_mps.is_finite() || speed_mps < 0.0 {
            return;
        }
        let speed_kmh = speed_mps * MPS_TO_KMH;
        if speed_kmh >= self.max_plausible_speed_kmh {
            self.suppressed += 1;
            return;
        }
        self.observe_max(speed_kmh);
    }

    fn observe_max(&mut self, speed_kmh: f64) {
        if speed_kmh > self.max_speed_kmh {
            self.max_speed_kmh = speed_kmh;
        }
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn current_speed_kmh(&self) -> f64 {
        self.current_speed_kmh
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    /// Speed observations dropped as implausible
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_plausible_speed_kmh);
    }
}
