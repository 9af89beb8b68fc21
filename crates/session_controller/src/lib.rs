//! # Session Controller
//!
//! Activity session lifecycle as a single-writer tokio task.
//!
//! ```text
//!            start            pause
//!   Idle ───────────▶ Tracking ─────▶ Paused
//!    ▲                  │  ▲  resume    │
//!    │   stop/discard   │  └───────────┘
//!    └──────────────────┴───────────────┘
//! ```
//!
//! Foreground fixes arrive through a bounded channel tagged with their
//! subscription generation; background fixes go to the durable relay and
//! are absorbed on `foreground()`.

mod actor;
mod command;
mod handle;
mod report;
mod settings;
mod subscription;

pub use handle::SessionController;
pub use report::{DrainReport, StopReport};
pub use settings::ControllerSettings;

pub use contracts::{LiveMetrics, SignalStatus, TrackingState};
pub use persistence::RetryReport;
