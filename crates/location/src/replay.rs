//! Replay provider - plays back a recorded track
//!
//! Reads a JSONL file with one `LocationSample` per line and delivers the
//! fixes with their original spacing, scaled by a speed multiplier.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    DeliveryMode, FixCallback, LocationProvider, LocationSample, LocationSettings,
    PermissionStatus, TrackerError,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{LocationError, Result};
use crate::metrics::LocationMetrics;
use crate::slots::CallbackSlots;

/// Replay 配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 回放速度倍率 (1.0 = 原速)
    pub speed_multiplier: f64,

    /// 将时间戳平移到当前时间
    pub rebase_timestamps: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            rebase_timestamps: true,
        }
    }
}

/// Playback totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub delivered: usize,
    /// Produced while nothing was watching (e.g. paused)
    pub undelivered: usize,
}

/// Replay provider
pub struct ReplayLocationProvider {
    name: String,
    fixes: Vec<LocationSample>,
    config: ReplayConfig,
    slots: CallbackSlots,
    metrics: Arc<LocationMetrics>,
    playing: Arc<AtomicBool>,
}

impl ReplayLocationProvider {
    /// Load a JSONL track file
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut fixes = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fix: LocationSample =
                serde_json::from_str(&line).map_err(|e| LocationError::ParseFailed {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            fixes.push(fix);
        }

        info!(path = %path.display(), fixes = fixes.len(), "track loaded");
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("replay")
            .to_string();
        Self::from_fixes(name, fixes, config)
    }

    /// Build from in-memory fixes
    pub fn from_fixes(
        name: impl Into<String>,
        mut fixes: Vec<LocationSample>,
        config: ReplayConfig,
    ) -> Result<Self> {
        let first_ts = fixes.first().ok_or(LocationError::EmptyTrack)?.timestamp_ms;
        if config.rebase_timestamps {
            let shift = chrono::Utc::now().timestamp_millis() - first_ts;
            for fix in &mut fixes {
                fix.timestamp_ms += shift;
            }
        }

        Ok(Self {
            name: name.into(),
            fixes,
            config,
            slots: CallbackSlots::default(),
            metrics: Arc::new(LocationMetrics::new()),
            playing: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn fixes(&self) -> &[LocationSample] {
        &self.fixes
    }

    pub fn metrics(&self) -> &Arc<LocationMetrics> {
        &self.metrics
    }

    /// Recorded duration of the track
    pub fn track_duration(&self) -> Duration {
        match (self.fixes.first(), self.fixes.last()) {
            (Some(first), Some(last)) => {
                Duration::from_millis((last.timestamp_ms - first.timestamp_ms).max(0) as u64)
            }
            _ => Duration::ZERO,
        }
    }

    /// Start playback after the initial fix
    ///
    /// The first fix is what `current_fix` answers, so delivery starts at
    /// the second one.
    pub fn play(self: &Arc<Self>) -> JoinHandle<ReplayStats> {
        let provider = Arc::clone(self);
        let playing = Arc::clone(&self.playing);
        playing.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let speed = if provider.config.speed_multiplier > 0.0 {
                provider.config.speed_multiplier
            } else {
                warn!(
                    speed = provider.config.speed_multiplier,
                    "invalid replay speed, using 1.0"
                );
                1.0
            };
            debug!(provider = %provider.name, speed, "replay started");

            let mut stats = ReplayStats::default();
            for pair in provider.fixes.windows(2) {
                if !playing.load(Ordering::SeqCst) {
                    break;
                }
                let gap_ms = (pair[1].timestamp_ms - pair[0].timestamp_ms).max(0) as f64;
                tokio::time::sleep(Duration::from_secs_f64(gap_ms / 1000.0 / speed)).await;

                match provider.slots.deliver(pair[1], &provider.metrics) {
                    Some(_) => stats.delivered += 1,
                    None => stats.undelivered += 1,
                }
            }

            playing.store(false, Ordering::SeqCst);
            info!(
                provider = %provider.name,
                delivered = stats.delivered,
                undelivered = stats.undelivered,
                "replay finished"
            );
            stats
        })
    }

    pub fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl LocationProvider for ReplayLocationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_fix(
        &self,
        _settings: &LocationSettings,
    ) -> std::result::Result<LocationSample, TrackerError> {
        self.fixes
            .first()
            .copied()
            .ok_or_else(|| TrackerError::location_unavailable(0, "empty track"))
    }

    fn watch(
        &self,
        _settings: &LocationSettings,
        mode: DeliveryMode,
        callback: FixCallback,
    ) -> std::result::Result<(), TrackerError> {
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
