//! Tracking run statistics.

use std::time::Duration;

use contracts::{ActivityKind, ActivitySession};
use observability::TrackingSummary;

/// Statistics from a tracking run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub kind: ActivityKind,

    /// Fixes handed to the controller by the playback task
    pub fixes_delivered: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// `persisted` or `queued`
    pub outcome: String,

    /// Id assigned by the remote store
    pub record_id: Option<String>,

    /// Saved session
    pub session: Option<ActivitySession>,

    /// Aggregated live metrics
    pub summary: TrackingSummary,
}

impl RunStats {
    /// Route points per delivered fix, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        let points = self.session.as_ref().map_or(0, |s| s.route.len());
        if self.fixes_delivered > 0 {
            // The initial fix is not delivered by playback
            (points.saturating_sub(1) as f64 / self.fixes_delivered as f64 * 100.0).min(100.0)
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Activity Summary ===\n");

        println!("Overview");
        println!("  Kind: {}", self.kind);
        println!("  Run time: {:.2}s", self.duration.as_secs_f64());
        println!("  Fixes delivered: {}", self.fixes_delivered);
        println!("  Outcome: {}", self.outcome);
        if let Some(id) = &self.record_id {
            println!("  Record id: {}", id);
        }

        if let Some(session) = &self.session {
            println!("\nSession");
            println!("  Name: {}", session.name);
            println!("  Date: {}", session.activity_date);
            println!("  Active time: {}s", session.duration_s);
            println!("  Distance: {:.1} m", session.distance_m);
            println!(
                "  Route points: {} ({:.1}% of fixes kept)",
                session.route.len(),
                self.acceptance_rate()
            );
            println!("  Average speed: {:.2} km/h", session.average_speed_kmh);
            println!("  Max speed: {:.2} km/h", session.max_speed_kmh);
        }

        println!("\n{}", self.summary);
    }
}
