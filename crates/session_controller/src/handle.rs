//! SessionController - handle to a running controller task

use std::sync::Arc;

use contracts::{
    ActivityKind, LiveMetrics, LocationProvider, ManualEntry, PendingWrite, RemoteStore,
    StopRequest, TrackerError, TrackingState,
};
use persistence::{BackgroundRelay, RetryReport, SessionPersister};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::actor::ControllerActor;
use crate::command::{Command, Reply};
use crate::report::{DrainReport, StopReport};
use crate::settings::ControllerSettings;

/// Handle to a running activity session controller
///
/// Every operation is a message to the controller task, which applies
/// them one at a time. Live metrics are published on a `watch` channel
/// after every fix, tick and lifecycle change.
pub struct SessionController {
    tx: mpsc::Sender<Command>,
    live_rx: watch::Receiver<LiveMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SessionController {
    /// Spawn the controller task
    pub fn spawn<P, S>(
        provider: Arc<P>,
        persister: SessionPersister<S>,
        relay: BackgroundRelay,
        settings: ControllerSettings,
    ) -> Self
    where
        P: LocationProvider + Send + Sync + 'static,
        S: RemoteStore + Send + 'static,
    {
        let (tx, commands) = mpsc::channel(settings.controller.command_capacity);
        let (fix_tx, fixes) = mpsc::channel(settings.controller.fix_capacity);
        let (live_tx, live_rx) = watch::channel(LiveMetrics::default());

        let actor = ControllerActor::new(provider, persister, relay, settings, fix_tx, live_tx);
        let worker_handle = tokio::spawn(actor.run(commands, fixes));

        Self {
            tx,
            live_rx,
            worker_handle,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| TrackerError::ControllerClosed)?;
        rx.await.map_err(|_| TrackerError::ControllerClosed)?
    }

    /// Begin a session
    ///
    /// # Errors
    /// `AlreadyActive`, `PermissionDenied` or `LocationUnavailable`; the
    /// controller stays idle with no subscription on every error.
    pub async fn start(&self, kind: ActivityKind) -> Result<(), TrackerError> {
        self.request(|reply| Command::Start { kind, reply }).await
    }

    pub async fn pause(&self) -> Result<(), TrackerError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<(), TrackerError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Finish the session and persist it
    ///
    /// # Errors
    /// `SaveFailed` carries the finished session when the store failed with
    /// no automatic recovery. The controller is idle either way.
    pub async fn stop(&self, request: StopRequest) -> Result<StopReport, TrackerError> {
        self.request(|reply| Command::Stop { request, reply }).await
    }

    /// Abandon the session without saving
    pub async fn discard(&self) -> Result<(), TrackerError> {
        self.request(|reply| Command::Discard { reply }).await
    }

    /// Switch to background delivery into the relay
    pub async fn suspend(&self) -> Result<(), TrackerError> {
        self.request(|reply| Command::Suspend { reply }).await
    }

    /// Absorb relayed fixes and switch back to foreground delivery
    pub async fn foreground(&self) -> Result<DrainReport, TrackerError> {
        self.request(|reply| Command::Foreground { reply }).await
    }

    /// Persist a manually entered activity
    pub async fn submit_manual(&self, entry: ManualEntry) -> Result<StopReport, TrackerError> {
        self.request(|reply| Command::SubmitManual { entry, reply })
            .await
    }

    pub async fn retry_pending(&self) -> Result<RetryReport, TrackerError> {
        self.request(|reply| Command::RetryPending { reply }).await
    }

    pub async fn pending_writes(&self) -> Result<Vec<PendingWrite>, TrackerError> {
        self.request(|reply| Command::PendingWrites { reply }).await
    }

    /// Metrics computed now, after every fix already delivered
    pub async fn metrics(&self) -> Result<LiveMetrics, TrackerError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Last published metrics
    pub fn live(&self) -> LiveMetrics {
        self.live_rx.borrow().clone()
    }

    pub fn state(&self) -> TrackingState {
        self.live_rx.borrow().state
    }

    /// Receiver for published metrics
    pub fn subscribe(&self) -> watch::Receiver<LiveMetrics> {
        self.live_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop the controller task, discarding any live session
    #[instrument(name = "session_controller_shutdown", skip(self))]
    pub async fn shutdown(self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(error = ?e, "controller task panicked");
        }
        debug!("controller shutdown complete");
    }
}
