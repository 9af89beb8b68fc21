//! Provider delivery metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DeliveryMode;

/// Delivery counters shared by a provider and its playback tasks
#[derive(Debug, Default)]
pub struct LocationMetrics {
    /// Fixes handed to a foreground callback
    pub delivered_foreground: AtomicU64,

    /// Fixes handed to a background callback
    pub delivered_background: AtomicU64,

    /// Fixes produced with no callback registered
    pub undelivered: AtomicU64,

    /// `watch` calls
    pub watch_calls: AtomicU64,

    /// `unwatch` calls
    pub unwatch_calls: AtomicU64,
}

impl LocationMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivered fix
    pub fn record_delivered(&self, mode: DeliveryMode) {
        let counter = match mode {
            DeliveryMode::Foreground => &self.delivered_foreground,
            DeliveryMode::Background => &self.delivered_background,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fix nobody was listening for
    pub fn record_undelivered(&self) {
        self.undelivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_watch(&self) {
        self.watch_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unwatch(&self) {
        self.unwatch_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered_foreground: self.delivered_foreground.load(Ordering::Relaxed),
            delivered_background: self.delivered_background.load(Ordering::Relaxed),
            undelivered: self.undelivered.load(Ordering::Relaxed),
            watch_calls: self.watch_calls.load(Ordering::Relaxed),
            unwatch_calls: self.unwatch_calls.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub delivered_foreground: u64,
    pub delivered_background: u64,
    pub undelivered: u64,
    pub watch_calls: u64,
    pub unwatch_calls: u64,
}
