//! Per-mode callback registry shared by provider implementations.

use std::sync::{Mutex, MutexGuard};

use contracts::{DeliveryMode, FixCallback, LocationSample};

use crate::metrics::LocationMetrics;

#[derive(Default)]
struct Slots {
    foreground: Option<FixCallback>,
    background: Option<FixCallback>,
}

impl Slots {
    fn slot(&mut self, mode: DeliveryMode) -> &mut Option<FixCallback> {
        match mode {
            DeliveryMode::Foreground => &mut self.foreground,
            DeliveryMode::Background => &mut self.background,
        }
    }
}

/// At most one callback per delivery mode
///
/// Callbacks are cloned out before invocation so no lock is held while
/// user code runs.
#[derive(Default)]
pub(crate) struct CallbackSlots {
    inner: Mutex<Slots>,
}

impl CallbackSlots {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set(&self, mode: DeliveryMode, callback: FixCallback) {
        *self.lock().slot(mode) = Some(callback);
    }

    /// Returns true if a callback was removed
    pub(crate) fn clear(&self, mode: DeliveryMode) -> bool {
        self.lock().slot(mode).take().is_some()
    }

    pub(crate) fn is_set(&self, mode: DeliveryMode) -> bool {
        self.lock().slot(mode).is_some()
    }

    /// Deliver to the callback registered for `mode`
    pub(crate) fn deliver_to(
        &self,
        mode: DeliveryMode,
        sample: LocationSample,
        metrics: &LocationMetrics,
    ) -> bool {
        let callback = self.lock().slot(mode).clone();
        match callback {
            Some(cb) => {
                cb(sample);
                metrics.record_delivered(mode);
                true
            }
            None => {
                metrics.record_undelivered();
                false
            }
        }
    }

    /// Deliver to whichever mode is active, foreground first
    pub(crate) fn deliver(
        &self,
        sample: LocationSample,
        metrics: &LocationMetrics,
    ) -> Option<DeliveryMode> {
        let active = {
            let slots = self.lock();
            slots
                .foreground
                .clone()
                .map(|cb| (DeliveryMode::Foreground, cb))
                .or_else(|| {
                    slots
                        .background
                        .clone()
                        .map(|cb| (DeliveryMode::Background, cb))
                })
        };
        match active {
            Some((mode, cb)) => {
                cb(sample);
                metrics.record_delivered(mode);
                ::metrics::counter!("tracker_provider_fixes_total", "mode" => mode_label(mode))
                    .increment(1);
                Some(mode)
            }
            None => {
                metrics.record_undelivered();
                None
            }
        }
    }
}

pub(crate) fn mode_label(mode: DeliveryMode) -> &'static str {
    match mode {
        DeliveryMode::Foreground => "foreground",
        DeliveryMode::Background => "background",
    }
}
