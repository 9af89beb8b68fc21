//! LocationProvider trait - device positioning abstraction
//!
//! Decouples the controller from concrete location sources, so the
//! platform GPS, scripted mocks and recorded tracks share one API.

use std::sync::Arc;

use crate::{DeliveryMode, LocationSample, LocationSettings, PermissionStatus, TrackerError};

/// Fix callback type
///
/// Providers hand every delivered fix to this callback. It may be invoked
/// from any thread, so implementations must only forward the sample.
pub type FixCallback = Arc<dyn Fn(LocationSample) + Send + Sync>;

/// Location provider trait
///
/// `watch` registers at most one callback per delivery mode; calling it
/// again for the same mode replaces the previous callback. `unwatch` is
/// synchronous so it can run from `Drop`.
///
/// # Example
///
/// ```ignore
/// let status = provider.request_permission().await;
/// let first = provider.current_fix(&settings).await?;
/// provider.watch(&settings, DeliveryMode::Foreground, Arc::new(|fix| {
///     println!("{} {}", fix.latitude, fix.longitude);
/// }))?;
/// // ...
/// provider.unwatch(DeliveryMode::Foreground);
/// ```
#[trait_variant::make(LocationProvider: Send)]
pub trait LocalLocationProvider {
    /// Provider name (used for logging)
    fn name(&self) -> &str;

    /// Current permission state, without prompting
    fn permission_status(&self) -> PermissionStatus;

    /// Prompt for permission if undetermined
    async fn request_permission(&self) -> PermissionStatus;

    /// Obtain a single fresh fix
    ///
    /// May never resolve; callers bound it with a timeout.
    async fn current_fix(&self, settings: &LocationSettings)
        -> Result<LocationSample, TrackerError>;

    /// Start delivering fixes in the given mode
    fn watch(
        &self,
        settings: &LocationSettings,
        mode: DeliveryMode,
        callback: FixCallback,
    ) -> Result<(), TrackerError>;

    /// Stop delivering fixes in the given mode (idempotent)
    fn unwatch(&self, mode: DeliveryMode);

    /// Whether a callback is registered for the mode
    fn is_watching(&self, mode: DeliveryMode) -> bool;
}
