//! Messages sent from the handle to the controller task

use contracts::{
    ActivityKind, LiveMetrics, LocationSample, ManualEntry, PendingWrite, StopRequest,
    TrackerError,
};
use persistence::RetryReport;
use tokio::sync::oneshot;

use crate::report::{DrainReport, StopReport};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, TrackerError>>;

pub(crate) enum Command {
    Start {
        kind: ActivityKind,
        reply: Reply<()>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    Stop {
        request: StopRequest,
        reply: Reply<StopReport>,
    },
    Discard {
        reply: Reply<()>,
    },
    Suspend {
        reply: Reply<()>,
    },
    Foreground {
        reply: Reply<DrainReport>,
    },
    SubmitManual {
        entry: ManualEntry,
        reply: Reply<StopReport>,
    },
    RetryPending {
        reply: Reply<RetryReport>,
    },
    PendingWrites {
        reply: Reply<Vec<PendingWrite>>,
    },
    Snapshot {
        reply: Reply<LiveMetrics>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::Stop { .. } => "stop",
            Self::Discard { .. } => "discard",
            Self::Suspend { .. } => "suspend",
            Self::Foreground { .. } => "foreground",
            Self::SubmitManual { .. } => "submit_manual",
            Self::RetryPending { .. } => "retry_pending",
            Self::PendingWrites { .. } => "pending_writes",
            Self::Snapshot { .. } => "snapshot",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

/// Fix forwarded from a foreground callback, tagged with its subscription
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixEvent {
    pub generation: u64,
    pub sample: LocationSample,
}
