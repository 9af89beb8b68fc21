//! Active-time clock that excludes paused intervals.
//!
//! Built on `tokio::time::Instant` so tests can drive it with a paused
//! runtime clock.

use std::time::Duration;

use tokio::time::Instant;

/// Elapsed active duration of a session
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started_at: Instant,
    paused_total: Duration,
    paused_since: Option<Instant>,
}

impl SessionClock {
    /// Start a clock now
    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn start_at(now: Instant) -> Self {
        Self {
            started_at: now,
            paused_total: Duration::ZERO,
            paused_since: None,
        }
    }

    /// Freeze elapsed time; returns false if already paused
    pub fn pause(&mut self) -> bool {
        self.pause_at(Instant::now())
    }

    pub fn pause_at(&mut self, now: Instant) -> bool {
        if self.paused_since.is_some() {
            return false;
        }
        self.paused_since = Some(now);
        true
    }

    /// Unfreeze elapsed time; returns false if not paused
    pub fn resume(&mut self) -> bool {
        self.resume_at(Instant::now())
    }

    pub fn resume_at(&mut self, now: Instant) -> bool {
        match self.paused_since.take() {
            Some(since) => {
                self.paused_total += now.saturating_duration_since(since);
                true
            }
            None => false,
        }
    }

    /// Active duration so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let until = self.paused_since.unwrap_or(now);
        until
            .saturating_duration_since(self.started_at)
            .saturating_sub(self.paused_total)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Total time spent paused so far
    pub fn paused_total_at(&self, now: Instant) -> Duration {
        let current = self
            .paused_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.paused_total + current
    }
}
