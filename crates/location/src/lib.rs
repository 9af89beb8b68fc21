//! # Location
//!
//! Location provider implementations.
//!
//! - [`MockLocationProvider`]: scriptable permissions, fixes and tracks
//! - [`ReplayLocationProvider`]: plays back a recorded JSONL track
//!
//! Both deliver through the `LocationProvider` contract, one callback per
//! delivery mode.

mod error;
mod metrics;
mod mock;
mod replay;
mod slots;

pub use error::{LocationError, Result};
pub use metrics::{LocationMetrics, MetricsSnapshot};
pub use mock::{synthetic_track, MockLocationProvider, MockProviderConfig};
pub use replay::{ReplayConfig, ReplayLocationProvider, ReplayStats};

// Re-export contracts types
pub use contracts::{DeliveryMode, FixCallback, LocationProvider, LocationSample};
