//! Streaming accept/reject decisions for raw fixes.
//!
//! Single pass, no lookahead: each decision needs only the candidate and
//! the last accepted point.

use contracts::{FilterConfig, LocationSample, RoutePoint};

use crate::geo::distance_meters;

/// Why a fix was dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Reported accuracy coarser than the limit
    LowAccuracy { accuracy_m: f64 },
    /// Movement below the jitter floor
    Stationary { distance_m: f64 },
    /// Discontinuous jump, never becomes the reference point
    Jump { distance_m: f64 },
    /// Timestamp earlier than the last accepted point
    OutOfOrder { behind_ms: i64 },
    /// Non-finite or out-of-range coordinates or accuracy
    Malformed,
}

impl RejectReason {
    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::LowAccuracy { .. } => "low_accuracy",
            Self::Stationary { .. } => "stationary",
            Self::Jump { .. } => "jump",
            Self::OutOfOrder { .. } => "out_of_order",
            Self::Malformed => "malformed",
        }
    }
}

/// Transition from the previous accepted point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub distance_m: f64,
    pub elapsed_s: f64,
    /// Derived speed, `None` when no time elapsed
    pub speed_kmh: Option<f64>,
    /// Derived speed reached the plausibility limit
    pub speed_suppressed: bool,
}

impl Segment {
    /// Derived speed usable for the speed accumulators
    pub fn reliable_speed_kmh(&self) -> Option<f64> {
        self.speed_kmh.filter(|_| !self.speed_suppressed)
    }
}

/// Filter decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    /// Append the point; `segment` is `None` for the first point
    Accept { segment: Option<Segment> },
    Reject(RejectReason),
}

/// Accuracy / movement / jump / plausibility filter
#[derive(Debug, Clone)]
pub struct SampleFilter {
    config: FilterConfig,
}

impl SampleFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Evaluate a candidate against the last accepted point
    pub fn evaluate(&self, sample: &LocationSample, last: Option<&RoutePoint>) -> FilterDecision {
        if !is_well_formed(sample) {
            return FilterDecision::Reject(RejectReason::Malformed);
        }
        if let Some(accuracy_m) = sample.accuracy_m {
            if accuracy_m > self.config.max_accuracy_m {
                return FilterDecision::Reject(RejectReason::LowAccuracy { accuracy_m });
            }
        }

        let Some(last) = last else {
            return FilterDecision::Accept { segment: None };
        };

        if sample.timestamp_ms < last.timestamp_ms {
            return FilterDecision::Reject(RejectReason::OutOfOrder {
                behind_ms: last.timestamp_ms.saturating_sub(sample.timestamp_ms),
            });
        }

        let distance_m = distance_meters(last.coord(), sample.coord());
        if distance_m < self.config.min_movement_m {
            return FilterDecision::Reject(RejectReason::Stationary { distance_m });
        }
        if distance_m > self.config.max_jump_m {
            return FilterDecision::Reject(RejectReason::Jump { distance_m });
        }

        let elapsed_s = sample.timestamp_ms.saturating_sub(last.timestamp_ms) as f64 / 1000.0;
        let speed_kmh = (elapsed_s > 0.0).then(|| distance_m / elapsed_s * 3.6);
        let speed_suppressed = speed_kmh.is_some_and(|s| s >= self.config.max_plausible_speed_kmh);

        FilterDecision::Accept {
            segment: Some(Segment {
                distance_m,
                elapsed_s,
                speed_kmh,
                speed_suppressed,
            }),
        }
    }
}

fn is_well_formed(sample: &LocationSample) -> bool {
    (-90.0..=90.0).contains(&sample.latitude)
        && (-180.0..=180.0).contains(&sample.longitude)
        && sample
            .accuracy_m
            .is_none_or(|a| a.is_finite() && a >= 0.0)
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
