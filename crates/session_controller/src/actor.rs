//! Controller task: owns every piece of session state
//!
//! Commands, foreground fixes and the duration tick are all handled by one
//! loop, so the engine, the clock and the subscription never need locks.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use contracts::{
    ActivityKind, ActivitySession, DeliveryMode, FixCallback, LiveMetrics, LocationProvider,
    LocationSample, LocationSettings, ManualEntry, PermissionStatus, PersistOutcome, RemoteStore,
    SignalStatus, StopRequest, TrackerError, TrackingState,
};
use persistence::{BackgroundRelay, RetryReport, SessionPersister};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use track_engine::{SessionClock, TrackEngine};

use crate::command::{Command, FixEvent};
use crate::report::{DrainReport, StopReport};
use crate::settings::ControllerSettings;
use crate::subscription::Subscription;

/// State of the one session a controller may hold
struct ActiveSession<P: LocationProvider> {
    kind: ActivityKind,
    started_at: DateTime<Utc>,
    engine: TrackEngine,
    clock: SessionClock,
    state: TrackingState,
    subscription: Option<Subscription<P>>,
    backgrounded: bool,
    /// Start of the current subscription
    subscribed_at: Instant,
    /// Last fix delivered since `subscribed_at`
    last_fix_at: Option<Instant>,
    delivery_error: bool,
}

impl<P: LocationProvider> ActiveSession<P> {
    fn signal_status(&self, now: Instant, stale_after: std::time::Duration) -> Option<SignalStatus> {
        if self.state != TrackingState::Tracking {
            return None;
        }
        if self.delivery_error {
            return Some(SignalStatus::Error);
        }
        let since = self.last_fix_at.unwrap_or(self.subscribed_at);
        if now.saturating_duration_since(since) > stale_after {
            Some(SignalStatus::Stale)
        } else if self.last_fix_at.is_none() {
            Some(SignalStatus::Searching)
        } else {
            Some(SignalStatus::Active)
        }
    }
}

pub(crate) struct ControllerActor<P: LocationProvider, S> {
    provider: Arc<P>,
    persister: SessionPersister<S>,
    relay: BackgroundRelay,
    settings: ControllerSettings,
    session: Option<ActiveSession<P>>,
    generation: u64,
    fix_tx: mpsc::Sender<FixEvent>,
    live_tx: watch::Sender<LiveMetrics>,
}

impl<P, S> ControllerActor<P, S>
where
    P: LocationProvider + Send + Sync + 'static,
    S: RemoteStore + Send + 'static,
{
    pub(crate) fn new(
        provider: Arc<P>,
        persister: SessionPersister<S>,
        relay: BackgroundRelay,
        settings: ControllerSettings,
        fix_tx: mpsc::Sender<FixEvent>,
        live_tx: watch::Sender<LiveMetrics>,
    ) -> Self {
        Self {
            provider,
            persister,
            relay,
            settings,
            session: None,
            generation: 0,
            fix_tx,
            live_tx,
        }
    }

    #[instrument(name = "session_controller_loop", skip_all, fields(provider = %self.provider.name()))]
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut fixes: mpsc::Receiver<FixEvent>,
    ) {
        let mut tick = tokio::time::interval(self.settings.controller.tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("controller started");

        loop {
            tokio::select! {
                biased;

                Some(event) = fixes.recv() => self.on_fix(event),

                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.teardown("shutdown");
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.teardown("handle dropped");
                        break;
                    }
                },

                _ = tick.tick() => self.on_tick(),
            }
        }

        debug!("controller stopped");
    }

    async fn handle(&mut self, command: Command) {
        debug!(command = command.name(), state = %self.state(), "command received");
        match command {
            Command::Start { kind, reply } => {
                let _ = reply.send(self.start(kind).await);
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::Stop { request, reply } => {
                let _ = reply.send(self.stop(request).await);
            }
            Command::Discard { reply } => {
                let _ = reply.send(self.discard());
            }
            Command::Suspend { reply } => {
                let _ = reply.send(self.suspend());
            }
            Command::Foreground { reply } => {
                let _ = reply.send(self.foreground());
            }
            Command::SubmitManual { entry, reply } => {
                let _ = reply.send(self.submit_manual(entry).await);
            }
            Command::RetryPending { reply } => {
                let _ = reply.send(self.retry_pending().await);
            }
            Command::PendingWrites { reply } => {
                let _ = reply.send(self.persister.pending().map_err(TrackerError::from));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Ok(self.live_metrics()));
            }
            // handled by the loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn state(&self) -> TrackingState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(TrackingState::Idle)
    }

    // ===== Lifecycle =====

    #[instrument(name = "session_start", skip(self), fields(kind = %kind))]
    async fn start(&mut self, kind: ActivityKind) -> Result<(), TrackerError> {
        if self.session.is_some() {
            return Err(TrackerError::AlreadyActive);
        }

        let mut permission = self.provider.permission_status();
        if permission == PermissionStatus::Undetermined {
            permission = self.provider.request_permission().await;
        }
        if !permission.is_granted() {
            warn!(?permission, "location permission not granted");
            return Err(TrackerError::PermissionDenied);
        }

        let seed = acquire_initial_fix(self.provider.as_ref(), &self.settings.location).await?;

        if let Err(e) = self.relay.clear() {
            warn!(error = %e, "failed to clear stale relay entries");
        }

        let mut engine = TrackEngine::new(self.settings.engine.clone());
        let seeded = engine.push(&seed);
        if !seeded.is_accepted() {
            warn!(reason = seeded.label(), "initial fix rejected");
        }

        let subscription = self.subscribe(DeliveryMode::Foreground)?;
        let now = Instant::now();
        self.session = Some(ActiveSession {
            kind,
            started_at: Utc::now(),
            engine,
            clock: SessionClock::start_at(now),
            state: TrackingState::Tracking,
            subscription: Some(subscription),
            backgrounded: false,
            subscribed_at: now,
            last_fix_at: Some(now),
            delivery_error: false,
        });

        info!(
            latitude = seed.latitude,
            longitude = seed.longitude,
            "tracking started"
        );
        self.publish();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), TrackerError> {
        let state = self.state();
        if state != TrackingState::Tracking {
            return Err(TrackerError::invalid_state("pause", state));
        }
        self.absorb_relay();

        if let Some(session) = self.session.as_mut() {
            session.subscription = None;
            session.clock.pause();
            session.state = TrackingState::Paused;
            info!(elapsed_s = session.clock.elapsed().as_secs(), "tracking paused");
        }
        self.publish();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), TrackerError> {
        let state = self.state();
        if state != TrackingState::Paused {
            return Err(TrackerError::invalid_state("resume", state));
        }

        let mode = match self.session.as_ref() {
            Some(s) if s.backgrounded => DeliveryMode::Background,
            _ => DeliveryMode::Foreground,
        };
        let subscription = self.subscribe(mode)?;

        if let Some(session) = self.session.as_mut() {
            let now = Instant::now();
            session.subscription = Some(subscription);
            session.clock.resume_at(now);
            session.state = TrackingState::Tracking;
            session.subscribed_at = now;
            session.last_fix_at = None;
            session.delivery_error = false;
            info!(elapsed_s = session.clock.elapsed_at(now).as_secs(), "tracking resumed");
        }
        self.publish();
        Ok(())
    }

    #[instrument(name = "session_stop", skip(self, request))]
    async fn stop(&mut self, request: StopRequest) -> Result<StopReport, TrackerError> {
        let state = self.state();
        if state == TrackingState::Idle {
            return Err(TrackerError::invalid_state("stop", state));
        }
        self.absorb_relay();

        let Some(active) = self.session.take() else {
            return Err(TrackerError::invalid_state("stop", TrackingState::Idle));
        };
        let session = finalize(active, request);
        self.publish();

        info!(
            session = %session.id,
            duration_s = session.duration_s,
            distance_m = session.distance_m,
            route_points = session.route.len(),
            "tracking stopped"
        );
        self.persist(session).await
    }

    fn discard(&mut self) -> Result<(), TrackerError> {
        let state = self.state();
        if state == TrackingState::Idle {
            return Err(TrackerError::invalid_state("discard", state));
        }
        self.teardown("discard");
        Ok(())
    }

    /// Drop any live session and its subscription
    fn teardown(&mut self, reason: &str) {
        if let Some(active) = self.session.take() {
            let distance_m = active.engine.distance_m();
            observability::record_session_finished(active.kind, "discarded", distance_m);
            info!(reason, kind = %active.kind, distance_m, "session discarded");
        }
        if let Err(e) = self.relay.clear() {
            warn!(error = %e, "failed to clear relay");
        }
        self.publish();
    }

    // ===== Backgrounding =====

    fn suspend(&mut self) -> Result<(), TrackerError> {
        let state = self.state();
        let Some(session) = self.session.as_mut() else {
            debug!("suspend without a session");
            return Ok(());
        };
        if session.backgrounded {
            return Ok(());
        }
        session.backgrounded = true;
        session.subscription = None;

        if state == TrackingState::Tracking {
            match self.subscribe(DeliveryMode::Background) {
                Ok(subscription) => {
                    if let Some(session) = self.session.as_mut() {
                        session.subscription = Some(subscription);
                    }
                }
                Err(e) => {
                    if let Some(session) = self.session.as_mut() {
                        session.delivery_error = true;
                    }
                    error!(error = %e, "background delivery unavailable");
                    self.publish();
                    return Err(e);
                }
            }
        }

        info!(%state, "session backgrounded");
        self.publish();
        Ok(())
    }

    fn foreground(&mut self) -> Result<DrainReport, TrackerError> {
        let state = self.state();
        let Some(session) = self.session.as_mut() else {
            debug!("foreground without a session");
            return Ok(DrainReport::default());
        };
        if !session.backgrounded {
            return Ok(DrainReport::default());
        }
        session.subscription = None;
        session.backgrounded = false;

        let report = self.absorb_relay();

        if state == TrackingState::Tracking {
            match self.subscribe(DeliveryMode::Foreground) {
                Ok(subscription) => {
                    if let Some(session) = self.session.as_mut() {
                        session.subscription = Some(subscription);
                        session.subscribed_at = Instant::now();
                        session.delivery_error = false;
                    }
                }
                Err(e) => {
                    if let Some(session) = self.session.as_mut() {
                        session.delivery_error = true;
                    }
                    error!(error = %e, "foreground delivery unavailable");
                    self.publish();
                    return Err(e);
                }
            }
        }

        info!(
            drained = report.drained,
            accepted = report.accepted,
            rejected = report.rejected,
            "session foregrounded"
        );
        self.publish();
        Ok(report)
    }

    /// Feed relayed fixes through the engine, oldest first
    fn absorb_relay(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        let fixes = match self.relay.drain_sorted() {
            Ok(fixes) => fixes,
            Err(e) => {
                error!(error = %e, "relay drain failed");
                return report;
            }
        };
        report.drained = fixes.len();

        let Some(session) = self.session.as_mut() else {
            report.ignored = fixes.len();
            return report;
        };
        if session.state != TrackingState::Tracking {
            report.ignored = fixes.len();
            return report;
        }

        for fix in &fixes {
            if session.engine.push(fix).is_accepted() {
                report.accepted += 1;
            } else {
                report.rejected += 1;
            }
        }
        if !fixes.is_empty() {
            session.last_fix_at = Some(Instant::now());
        }
        report
    }

    // ===== Persistence =====

    async fn submit_manual(&mut self, entry: ManualEntry) -> Result<StopReport, TrackerError> {
        let session = ActivitySession::manual(entry)?;
        info!(session = %session.id, kind = %session.kind, "manual entry submitted");
        self.persist(session).await
    }

    async fn persist(&mut self, session: ActivitySession) -> Result<StopReport, TrackerError> {
        let outcome = self.persister.persist(&session).await;
        observability::record_session_finished(session.kind, outcome.label(), session.distance_m);

        match outcome {
            PersistOutcome::Failed(e) => Err(TrackerError::save_failed(e.to_string(), session)),
            outcome => Ok(StopReport { session, outcome }),
        }
    }

    async fn retry_pending(&mut self) -> Result<RetryReport, TrackerError> {
        let report = self.persister.retry_pending().await?;
        info!(
            persisted = report.persisted.len(),
            requeued = report.requeued,
            discarded = report.discarded,
            "pending writes retried"
        );
        Ok(report)
    }

    // ===== Fix delivery =====

    fn subscribe(&mut self, mode: DeliveryMode) -> Result<Subscription<P>, TrackerError> {
        self.generation += 1;
        let generation = self.generation;

        let callback: FixCallback = match mode {
            DeliveryMode::Foreground => {
                let tx = self.fix_tx.clone();
                Arc::new(move |sample: LocationSample| {
                    match tx.try_send(FixEvent { generation, sample }) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            metrics::counter!("tracker_fixes_total", "outcome" => "dropped")
                                .increment(1);
                            warn!(timestamp_ms = sample.timestamp_ms, "fix channel full, fix dropped");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {}
                    }
                })
            }
            DeliveryMode::Background => self.relay.callback(),
        };

        Subscription::acquire(
            &self.provider,
            &self.settings.location,
            mode,
            generation,
            callback,
        )
    }

    fn on_fix(&mut self, event: FixEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let current = session
            .subscription
            .as_ref()
            .filter(|s| s.mode() == DeliveryMode::Foreground)
            .map(|s| s.generation());
        if current != Some(event.generation) || session.state != TrackingState::Tracking {
            debug!(
                generation = event.generation,
                timestamp_ms = event.sample.timestamp_ms,
                "fix from released subscription ignored"
            );
            return;
        }

        session.last_fix_at = Some(Instant::now());
        session.engine.push(&event.sample);
        self.publish();
    }

    fn on_tick(&mut self) {
        if self.session.is_none() {
            return;
        }
        let live = self.publish();
        observability::record_signal_status(live.status);
    }

    // ===== Live metrics =====

    fn live_metrics(&self) -> LiveMetrics {
        let Some(session) = self.session.as_ref() else {
            return LiveMetrics::default();
        };
        let now = Instant::now();
        let snapshot = session.engine.snapshot();
        let elapsed = session.clock.elapsed_at(now);

        LiveMetrics {
            state: session.state,
            kind: Some(session.kind),
            route_points: snapshot.route_points,
            distance_m: snapshot.distance_m,
            elapsed_s: elapsed.as_secs_f64(),
            current_speed_kmh: snapshot.current_speed_kmh,
            max_speed_kmh: snapshot.max_speed_kmh,
            average_speed_kmh: ActivitySession::average_speed(
                snapshot.distance_m,
                elapsed.as_secs(),
            ),
            status: session.signal_status(now, self.settings.controller.stale_after()),
            backgrounded: session.backgrounded,
        }
    }

    fn publish(&self) -> LiveMetrics {
        let live = self.live_metrics();
        self.live_tx.send_replace(live.clone());
        live
    }
}

/// Bounded initial fix acquisition
async fn acquire_initial_fix<P: LocationProvider>(
    provider: &P,
    settings: &LocationSettings,
) -> Result<LocationSample, TrackerError> {
    let waited_ms = settings.fix_timeout_ms;

    match tokio::time::timeout(settings.fix_timeout(), provider.current_fix(settings)).await {
        Ok(Ok(fix)) => Ok(fix),
        Ok(Err(TrackerError::PermissionDenied)) => Err(TrackerError::PermissionDenied),
        Ok(Err(e)) => {
            warn!(error = %e, "initial fix failed");
            Err(TrackerError::location_unavailable(waited_ms, e.to_string()))
        }
        Err(_) => {
            warn!(waited_ms, "initial fix timed out");
            Err(TrackerError::location_unavailable(
                waited_ms,
                "no fix within timeout",
            ))
        }
    }
}

/// Build the finished record; dropping `active` releases its subscription
fn finalize<P: LocationProvider>(active: ActiveSession<P>, request: StopRequest) -> ActivitySession {
    let duration_s = active.clock.elapsed().as_secs();
    let distance_m = active.engine.distance_m();
    let activity_date = request
        .activity_date
        .unwrap_or_else(|| active.started_at.with_timezone(&Local).date_naive());
    let name = if request.name.trim().is_empty() {
        ActivitySession::default_name(active.kind, activity_date)
    } else {
        request.name
    };
    let end_time = Utc::now().max(active.started_at);

    ActivitySession {
        id: ActivitySession::make_id(active.kind, active.started_at),
        kind: active.kind,
        name,
        start_time: active.started_at,
        end_time,
        activity_date,
        duration_s,
        distance_m,
        route: active.engine.route().to_vec(),
        average_speed_kmh: ActivitySession::average_speed(distance_m, duration_s),
        max_speed_kmh: active.engine.max_speed_kmh(),
        notes: request.notes.unwrap_or_default(),
        photos: request.photos,
        manual_entry: false,
    }
}
