//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Fix timestamps are wall-clock milliseconds reported by the device
//! - Session durations come from a monotonic clock owned by the controller

mod blueprint;
mod engine_config;
mod error;
mod live;
mod location;
mod provider;
mod session;
mod store;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use live::*;
pub use location::*;
pub use provider::{FixCallback, LocalLocationProvider, LocationProvider};
pub use session::*;
pub use store::*;
