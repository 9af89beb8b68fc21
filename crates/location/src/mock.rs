//! Mock location provider
//!
//! Scriptable provider for tests and the CLI's simulated runs: fixed
//! permission answers, an optional initial fix, manual emission and a
//! synthetic-track playback task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    DeliveryMode, FixCallback, GeoCoord, LocationProvider, LocationSample, LocationSettings,
    PermissionStatus, TrackerError,
};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::metrics::LocationMetrics;
use crate::slots::CallbackSlots;

/// Mock provider configuration
#[derive(Debug, Clone)]
pub struct MockProviderConfig {
    /// Provider name
    pub name: String,

    /// Permission reported before any request
    pub permission: PermissionStatus,

    /// Whether `request_permission` grants an undetermined permission
    pub grant_on_request: bool,

    /// Fix returned by `current_fix`; `None` never resolves
    pub initial_fix: Option<LocationSample>,

    /// Simulated acquisition latency
    pub fix_delay: Duration,
}

impl Default for MockProviderConfig {
    fn default() -> Self {
        Self {
            name: "mock_gps".to_string(),
            permission: PermissionStatus::Granted,
            grant_on_request: true,
            initial_fix: None,
            fix_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug)]
struct MockState {
    permission: PermissionStatus,
    grant_on_request: bool,
    initial_fix: Option<LocationSample>,
    fix_delay: Duration,
}

/// Mock location provider
pub struct MockLocationProvider {
    name: String,
    state: Mutex<MockState>,
    slots: CallbackSlots,
    metrics: Arc<LocationMetrics>,
    fail_next_watch: AtomicBool,
    simulating: Arc<AtomicBool>,
}

impl MockLocationProvider {
    /// Create a new mock provider
    pub fn new(config: MockProviderConfig) -> Self {
        Self {
            name: config.name,
            state: Mutex::new(MockState {
                permission: config.permission,
                grant_on_request: config.grant_on_request,
                initial_fix: config.initial_fix,
                fix_delay: config.fix_delay,
            }),
            slots: CallbackSlots::default(),
            metrics: Arc::new(LocationMetrics::new()),
            fail_next_watch: AtomicBool::new(false),
            simulating: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Permission granted, `current_fix` answers with `initial_fix`
    pub fn granted(initial_fix: LocationSample) -> Self {
        Self::new(MockProviderConfig {
            initial_fix: Some(initial_fix),
            ..Default::default()
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        self.state().permission = permission;
    }

    pub fn set_grant_on_request(&self, grant: bool) {
        self.state().grant_on_request = grant;
    }

    pub fn set_initial_fix(&self, fix: Option<LocationSample>) {
        self.state().initial_fix = fix;
    }

    /// Make the next `watch` call fail once
    pub fn fail_next_watch(&self) {
        self.fail_next_watch.store(true, Ordering::SeqCst);
    }

    /// Deliver a fix to the foreground callback
    ///
    /// Returns false if nothing is watching in foreground mode.
    pub fn emit(&self, sample: LocationSample) -> bool {
        self.slots
            .deliver_to(DeliveryMode::Foreground, sample, &self.metrics)
    }

    /// Deliver a fix through background delivery
    pub fn emit_background(&self, sample: LocationSample) -> bool {
        self.slots
            .deliver_to(DeliveryMode::Background, sample, &self.metrics)
    }

    /// Deliver a fix to whichever mode is active
    pub fn deliver(&self, sample: LocationSample) -> Option<DeliveryMode> {
        self.slots.deliver(sample, &self.metrics)
    }

    pub fn metrics(&self) -> &Arc<LocationMetrics> {
        &self.metrics
    }

    /// Play a track, one fix per `interval`, to whichever mode is active
    ///
    /// Returns the number of fixes delivered. Stops early on
    /// [`stop_simulation`](Self::stop_simulation).
    pub fn simulate(
        self: &Arc<Self>,
        track: Vec<LocationSample>,
        interval: Duration,
    ) -> JoinHandle<usize> {
        let provider = Arc::clone(self);
        let running = Arc::clone(&self.simulating);
        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            debug!(provider = %provider.name, fixes = track.len(), "simulation started");
            let mut delivered = 0;
            for sample in track {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                tokio::time::sleep(interval).await;
                if provider.deliver(sample).is_some() {
                    delivered += 1;
                }
                trace!(timestamp_ms = sample.timestamp_ms, "simulated fix");
            }
            running.store(false, Ordering::SeqCst);
            debug!(provider = %provider.name, delivered, "simulation finished");
            delivered
        })
    }

    pub fn stop_simulation(&self) {
        self.simulating.store(false, Ordering::SeqCst);
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating.load(Ordering::SeqCst)
    }
}

impl LocationProvider for MockLocationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn permission_status(&self) -> PermissionStatus {
        self.state().permission
    }

    async fn request_permission(&self) -> PermissionStatus {
        let mut state = self.state();
        if state.permission == PermissionStatus::Undetermined {
            state.permission = if state.grant_on_request {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
        }
        state.permission
    }

    async fn current_fix(
        &self,
        _settings: &LocationSettings,
    ) -> Result<LocationSample, TrackerError> {
        let (fix, delay) = {
            let state = self.state();
            (state.initial_fix, state.fix_delay)
        };
        match fix {
            Some(sample) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(sample)
            }
            None => std::future::pending().await,
        }
    }

    fn watch(
        &self,
        _settings: &LocationSettings,
        mode: DeliveryMode,
        callback: FixCallback,
    ) -> Result<(), TrackerError> {
        if self.fail_next_watch.swap(false, Ordering::SeqCst) {
            return Err(TrackerError::provider("watch refused by mock"));
        }
        self.metrics.record_watch();
        self.slots.set(mode, callback);
        Ok(())
    }

    fn unwatch(&self, mode: DeliveryMode) {
        if self.slots.clear(mode) {
            self.metrics.record_unwatch();
        }
    }

    fn is_watching(&self, mode: DeliveryMode) -> bool {
        self.slots.is_set(mode)
    }
}

/// Straight eastward track along a parallel
///
/// `step_m` meters between fixes, `interval_ms` apart, starting at `t0_ms`.
pub fn synthetic_track(
    start: GeoCoord,
    points: usize,
    step_m: f64,
    interval_ms: i64,
    t0_ms: i64,
) -> Vec<LocationSample> {
    let meters_per_degree =
        std::f64::consts::PI / 180.0 * 6_371_000.0 * start.latitude.to_radians().cos();
    let step_deg = if meters_per_degree > 0.0 {
        step_m / meters_per_degree
    } else {
        0.0
    };
    let speed_mps = step_m / (interval_ms.max(1) as f64 / 1000.0);

    (0..points)
        .map(|i| {
            LocationSample::new(
                start.latitude,
                start.longitude + step_deg * i as f64,
                t0_ms + interval_ms * i as i64,
            )
            .with_accuracy(5.0)
            .with_speed(speed_mps)
        })
        .collect()
}
