//! Track engine: filter -> route buffer + accumulators.

use contracts::{EngineConfig, LocationSample, RoutePoint};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::accumulator::DistanceSpeedAccumulator;
use crate::buffer::RouteBuffer;
use crate::filter::{FilterDecision, RejectReason, SampleFilter};

/// Result of pushing one fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    Accepted {
        /// Distance added by this fix (0 for the first point)
        segment_m: f64,
        /// Derived speed, if time elapsed
        speed_kmh: Option<f64>,
        speed_suppressed: bool,
        /// Route buffer compacted to make room
        compacted: bool,
    },
    Rejected(RejectReason),
}

impl FixOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected(reason) => reason.label(),
        }
    }
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub route_points: usize,
    pub distance_m: f64,
    pub current_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub accepted: u64,
    pub rejected: u64,
    pub compactions: u64,
    pub last_fix_ms: Option<i64>,
}

/// Single-writer fix pipeline for one session
#[derive(Debug)]
pub struct TrackEngine {
    filter: SampleFilter,
    route: RouteBuffer,
    stats: DistanceSpeedAccumulator,
    accepted: u64,
    rejected: u64,
}

impl TrackEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        let stats = DistanceSpeedAccumulator::new(config.filter.max_plausible_speed_kmh);
        Self {
            route: RouteBuffer::new(&config.route),
            filter: SampleFilter::new(config.filter),
            stats,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Push a fix through the filter
    ///
    /// Rejected fixes leave every accumulator untouched.
    #[instrument(
        level = "trace",
        name = "track_engine_push",
        skip(self, sample),
        fields(timestamp_ms = sample.timestamp_ms)
    )]
    pub fn push(&mut self, sample: &LocationSample) -> FixOutcome {
        let outcome = match self.filter.evaluate(sample, self.route.last()) {
            FilterDecision::Reject(reason) => {
                self.rejected += 1;
                trace!(reason = reason.label(), "fix rejected");
                FixOutcome::Rejected(reason)
            }
            FilterDecision::Accept { segment } => {
                if let Some(ref segment) = segment {
                    self.stats.record(segment);
                }
                if let Some(speed_mps) = sample.speed_mps {
                    self.stats.observe_device_speed(speed_mps);
                }
                let compacted = self.route.push(RoutePoint::from(sample));
                if compacted {
                    metrics::counter!("tracker_route_compactions_total").increment(1);
                    debug!(route_points = self.route.len(), "route compacted");
                }
                self.accepted += 1;
                FixOutcome::Accepted {
                    segment_m: segment.map(|s| s.distance_m).unwrap_or(0.0),
                    speed_kmh: segment.and_then(|s| s.speed_kmh),
                    speed_suppressed: segment.is_some_and(|s| s.speed_suppressed),
                    compacted,
                }
            }
        };

        metrics::counter!("tracker_fixes_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Push many fixes, returning how many were accepted
    pub fn extend<'a, I>(&mut self, samples: I) -> usize
    where
        I: IntoIterator<Item = &'a LocationSample>,
    {
        samples
            .into_iter()
            .filter(|s| self.push(s).is_accepted())
            .count()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            route_points: self.route.len(),
            distance_m: self.stats.distance_m(),
            current_speed_kmh: self.stats.current_speed_kmh(),
            max_speed_kmh: self.stats.max_speed_kmh(),
            accepted: self.accepted,
            rejected: self.rejected,
            compactions: self.route.compactions(),
            last_fix_ms: self.route.last().map(|p| p.timestamp_ms),
        }
    }

    pub fn route(&self) -> &[RoutePoint] {
        self.route.points()
    }

    pub fn distance_m(&self) -> f64 {
        self.stats.distance_m()
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.stats.max_speed_kmh()
    }

    /// Clear all session state
    pub fn reset(&mut self) {
        self.route.clear();
        self.stats.reset();
        self.accepted = 0;
        self.rejected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RouteBufferConfig;

    const T0: i64 = 1_700_000_000_000;

    fn engine() -> TrackEngine {
        TrackEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_nan_fix_does_not_poison_distance() {
        let mut engine = engine();
        engine.push(&LocationSample::new(0.0, 0.0, T0));
        let outcome = engine.push(&LocationSample::new(f64::NAN, f64::NAN, T0 + 1_000));
        assert!(matches!(outcome, FixOutcome::Rejected(RejectReason::Malformed)));
        engine.push(&LocationSample::new(0.0, 0.001, T0 + 10_000));
        assert!((engine.distance_m() - 111.195).abs() < 0.01);
        assert_eq!(engine.route().len(), 2);
    }

    #[test]
    fn test_abcd_route() {
        let mut engine = engine();
        let a = LocationSample::new(0.0, 0.0, T0);
        let b = LocationSample::new(0.0, 0.001, T0 + 10_000);
        let c = LocationSample::new(0.0, 0.01, T0 + 10_100);
        let d = LocationSample::new(0.0, 0.002, T0 + 20_000);

        assert!(engine.push(&a).is_accepted());
        assert!(engine.push(&b).is_accepted());
        assert!(matches!(
            engine.push(&c),
            FixOutcome::Rejected(RejectReason::Jump { .. })
        ));
        assert!(engine.push(&d).is_accepted());

        let route: Vec<_> = engine.route().iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(route, vec![T0, T0 + 10_000, T0 + 20_000]);
        assert!((engine.distance_m() - 222.39).abs() < 0.01);

        let snap = engine.snapshot();
        assert_eq!(snap.accepted, 3);
        assert_eq!(snap.rejected, 1);
        assert!((snap.current_speed_kmh - 40.03).abs() < 0.01);
    }

    #[test]
    fn test_jump_does_not_become_reference() {
        let mut engine = engine();
        engine.push(&LocationSample::new(0.0, 0.0, T0));
        // ~1500 m away
        assert!(!engine.push(&LocationSample::new(0.0, 0.01349, T0 + 60_000)).is_accepted());
        // 111 m from the original point, 1390 m from the jump
        let outcome = engine.push(&LocationSample::new(0.0, 0.001, T0 + 70_000));
        let FixOutcome::Accepted { segment_m, .. } = outcome else {
            panic!("expected accept, got {outcome:?}");
        };
        assert!((segment_m - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_rejected_fix_leaves_state_untouched() {
        let mut engine = engine();
        engine.push(&LocationSample::new(0.0, 0.0, T0));
        engine.push(&LocationSample::new(0.0, 0.001, T0 + 10_000));
        let before = engine.snapshot();
        engine.push(&LocationSample::new(0.0, 0.002, T0 + 20_000).with_accuracy(75.0));
        let after = engine.snapshot();
        assert_eq!(before.distance_m, after.distance_m);
        assert_eq!(before.route_points, after.route_points);
        assert_eq!(after.rejected, before.rejected + 1);
    }

    #[test]
    fn test_device_speed_raises_max() {
        let mut engine = engine();
        engine.push(&LocationSample::new(0.0, 0.0, T0).with_speed(8.0));
        assert!((engine.max_speed_kmh() - 28.8).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = engine();
        for i in 0..5 {
            engine.push(&LocationSample::new(0.0, i as f64 * 0.001, T0 + i * 10_000));
        }
        engine.reset();
        assert_eq!(engine.snapshot(), EngineSnapshot::default());
        assert!(engine.route().is_empty());
    }

    #[test]
    fn test_long_session_bounded() {
        let mut engine = TrackEngine::new(EngineConfig {
            route: RouteBufferConfig {
                max_points: 50,
                recent_points: 10,
            },
            ..Default::default()
        });
        let samples: Vec<_> = (0..500)
            .map(|i| LocationSample::new(0.0, i as f64 * 0.0001, T0 + i * 5_000))
            .collect();
        assert_eq!(engine.extend(&samples), 500);
        let snap = engine.snapshot();
        assert!(snap.route_points <= 50);
        assert!(snap.compactions > 0);
        assert_eq!(engine.route()[0].timestamp_ms, T0);
        // distance is counted on every segment regardless of compaction
        assert!((snap.distance_m - 499.0 * 11.1195).abs() < 0.5);
    }
}
