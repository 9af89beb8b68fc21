//! Tracking run orchestrator - wires provider, persistence and controller.
//!
//! Fixes come from either a recorded JSONL track or a simulated
//! straight-line route; both drive the same controller loop.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    ActivityKind, GeoCoord, LocationProvider, PersistOutcome, StopRequest, TrackerBlueprint,
    TrackerError,
};
use location::{
    synthetic_track, MockLocationProvider, ReplayConfig, ReplayLocationProvider,
};
use observability::TrackingMetricsAggregator;
use persistence::{
    create_store, open_queue, BackgroundRelay, ConfiguredStore, RecordCodec, SessionPersister,
};
use session_controller::{ControllerSettings, SessionController};
use tracing::{info, warn};

use super::RunStats;
use crate::error::CliError;

/// Where fixes come from
#[derive(Debug, Clone)]
pub enum FixSource {
    /// Recorded JSONL track of location samples
    Replay { path: PathBuf, speed: f64 },
    /// Straight eastward track, one fix per second
    Simulated { points: usize, step_m: f64 },
}

/// Simulated tracks start in Seattle
const SIMULATED_ORIGIN: GeoCoord = GeoCoord::new(47.6062, -122.3321);
const SIMULATED_INTERVAL_MS: i64 = 1000;

/// Tracking run configuration
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub blueprint: TrackerBlueprint,
    pub kind: ActivityKind,
    pub name: Option<String>,
    pub source: FixSource,

    /// Stop after this long (None = when the track ends)
    pub max_duration: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

type Playback = Pin<Box<dyn Future<Output = usize> + Send>>;

/// Build the session persister described by the blueprint
pub fn build_persister(blueprint: &TrackerBlueprint) -> Result<SessionPersister<ConfiguredStore>> {
    let store = create_store(&blueprint.store).context("Failed to create remote store")?;
    let pending = open_queue(&blueprint.pending).with_context(|| {
        format!("Failed to open pending queue at {}", blueprint.pending.path)
    })?;
    Ok(SessionPersister::new(
        store,
        pending,
        RecordCodec::new(blueprint.pending.format),
    ))
}

/// One recorded activity, start to save
pub struct TrackingRun {
    config: TrackingConfig,
}

impl TrackingRun {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    /// Run until the track ends, the deadline passes or `shutdown` fires
    ///
    /// The activity is stopped and saved in every case.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        match self.config.source.clone() {
            FixSource::Replay { path, speed } => {
                info!(path = %path.display(), speed, "Running in REPLAY mode");
                let provider = Arc::new(
                    ReplayLocationProvider::load(
                        &path,
                        ReplayConfig {
                            speed_multiplier: speed,
                            rebase_timestamps: true,
                        },
                    )
                    .with_context(|| format!("Failed to load track {}", path.display()))?,
                );
                info!(
                    fixes = provider.fixes().len(),
                    track_secs = provider.track_duration().as_secs(),
                    "Track loaded"
                );

                let player = Arc::clone(&provider);
                let start_playback = move || -> Playback {
                    let handle = player.play();
                    Box::pin(async move {
                        match handle.await {
                            Ok(stats) => stats.delivered,
                            Err(e) => {
                                warn!(error = %e, "replay task failed");
                                0
                            }
                        }
                    })
                };
                let stop_playback = {
                    let provider = Arc::clone(&provider);
                    move || provider.stop()
                };
                self.track(provider, start_playback, stop_playback, shutdown)
                    .await
            }
            FixSource::Simulated { points, step_m } => {
                info!(points, step_m, "Running in SIMULATED mode");
                let t0 = chrono::Utc::now().timestamp_millis();
                let mut track =
                    synthetic_track(SIMULATED_ORIGIN, points.max(1), step_m, SIMULATED_INTERVAL_MS, t0);
                let initial = track.remove(0);
                let provider = Arc::new(MockLocationProvider::granted(initial));

                let player = Arc::clone(&provider);
                let start_playback = move || -> Playback {
                    let handle = player.simulate(
                        track,
                        Duration::from_millis(SIMULATED_INTERVAL_MS as u64),
                    );
                    Box::pin(async move { handle.await.unwrap_or_default() })
                };
                let stop_playback = {
                    let provider = Arc::clone(&provider);
                    move || provider.stop_simulation()
                };
                self.track(provider, start_playback, stop_playback, shutdown)
                    .await
            }
        }
    }

    async fn track<P>(
        self,
        provider: Arc<P>,
        start_playback: impl FnOnce() -> Playback,
        stop_playback: impl FnOnce(),
        shutdown: impl Future<Output = ()>,
    ) -> Result<RunStats>
    where
        P: LocationProvider + Send + Sync + 'static,
    {
        let started = Instant::now();
        let blueprint = &self.config.blueprint;

        let persister = build_persister(blueprint)?;
        let relay_queue = open_queue(&blueprint.relay)
            .with_context(|| format!("Failed to open relay queue at {}", blueprint.relay.path))?;
        let relay = BackgroundRelay::new(relay_queue, RecordCodec::new(blueprint.relay.format));

        let controller = SessionController::spawn(
            provider,
            persister,
            relay,
            ControllerSettings::from_blueprint(blueprint),
        );
        let mut live = controller.subscribe();

        info!(kind = %self.config.kind, "Starting activity...");
        if let Err(e) = controller.start(self.config.kind).await {
            controller.shutdown().await;
            return Err(e).context("Failed to start activity");
        }

        let mut stats = RunStats {
            kind: self.config.kind,
            ..Default::default()
        };
        let mut aggregator = TrackingMetricsAggregator::new();

        let playback = start_playback();
        tokio::pin!(playback);
        tokio::pin!(shutdown);

        let deadline = async {
            match self.config.max_duration {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                delivered = &mut playback => {
                    stats.fixes_delivered = delivered;
                    info!(delivered, "Track finished");
                    break;
                }
                _ = &mut deadline => {
                    info!("Reached max duration");
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping activity...");
                    break;
                }
                changed = live.changed() => {
                    if changed.is_err() {
                        warn!("Controller stopped publishing metrics");
                        break;
                    }
                    aggregator.update(&live.borrow_and_update());
                }
            }
        }
        stop_playback();

        // Let the controller apply fixes already in flight
        if let Ok(snapshot) = controller.metrics().await {
            aggregator.update(&snapshot);
        }

        let request = StopRequest::named(self.config.name.clone().unwrap_or_default());
        let result = controller.stop(request).await;
        controller.shutdown().await;

        stats.summary = aggregator.summary();
        stats.duration = started.elapsed();

        match result {
            Ok(report) => {
                stats.outcome = report.outcome.label().to_string();
                stats.record_id = report.record_id().map(str::to_string);
                if let PersistOutcome::QueuedForRetry { reason } = &report.outcome {
                    warn!(reason = %reason, "Activity queued for retry");
                }
                stats.session = Some(report.session);
                Ok(stats)
            }
            Err(TrackerError::SaveFailed { reason, session }) => {
                Err(CliError::save_failed(session.id, reason).into())
            }
            Err(e) => Err(e).context("Failed to stop activity"),
        }
    }
}
