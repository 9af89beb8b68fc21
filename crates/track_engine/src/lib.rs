//! # Track Engine
//!
//! Turns a stream of noisy GPS fixes into a bounded, denoised route.
//!
//! Responsibilities:
//! - Haversine geometry
//! - Accuracy / jitter / jump / plausibility filtering
//! - Bounded route storage with compaction
//! - Distance, speed and active-time accounting
//!
//! ## Example
//!
//! ```ignore
//! use track_engine::{TrackEngine, EngineConfig};
//!
//! let mut engine = TrackEngine::new(EngineConfig::default());
//! for fix in fixes {
//!     let outcome = engine.push(&fix);
//!     println!("{}: {:.1} m", outcome.label(), engine.distance_m());
//! }
//! ```

mod accumulator;
mod buffer;
mod clock;
mod engine;
mod filter;
pub mod geo;

pub use accumulator::DistanceSpeedAccumulator;
pub use buffer::RouteBuffer;
pub use clock::SessionClock;
pub use engine::{EngineSnapshot, FixOutcome, TrackEngine};
pub use filter::{FilterDecision, RejectReason, SampleFilter, Segment};
pub use crate::geo::{bearing_degrees, distance_meters};

// Re-export contracts types
pub use contracts::{EngineConfig, FilterConfig, LocationSample, RouteBufferConfig, RoutePoint};
