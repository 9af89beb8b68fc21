//! Scoped location subscription

use std::sync::Arc;

use contracts::{DeliveryMode, FixCallback, LocationProvider, LocationSettings, TrackerError};
use tracing::debug;

/// Live `watch` registration; dropping it calls `unwatch`
pub(crate) struct Subscription<P: LocationProvider> {
    provider: Arc<P>,
    mode: DeliveryMode,
    generation: u64,
}

impl<P: LocationProvider> Subscription<P> {
    pub(crate) fn acquire(
        provider: &Arc<P>,
        settings: &LocationSettings,
        mode: DeliveryMode,
        generation: u64,
        callback: FixCallback,
    ) -> Result<Self, TrackerError> {
        provider.watch(settings, mode, callback)?;
        debug!(provider = %provider.name(), ?mode, generation, "location subscription acquired");
        Ok(Self {
            provider: Arc::clone(provider),
            mode,
            generation,
        })
    }

    pub(crate) fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl<P: LocationProvider> Drop for Subscription<P> {
    fn drop(&mut self) {
        self.provider.unwatch(self.mode);
        debug!(provider = %self.provider.name(), mode = ?self.mode, generation = self.generation, "location subscription released");
    }
}
