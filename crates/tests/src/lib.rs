//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 控制器端到端测试（模拟定位源 + 内存/文件存储）
//! - 配置驱动的持久化恢复测试

#[cfg(test)]
mod contract_tests {
    use contracts::{ActivityKind, ConfigVersion, TrackerBlueprint};

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = TrackerBlueprint::default();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_ok());
    }

    #[test]
    fn test_blueprint_toml_round_trip() {
        let blueprint = TrackerBlueprint::default();
        let toml = config_loader::ConfigLoader::to_toml(&blueprint).unwrap();
        let parsed =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(parsed.filter, blueprint.filter);
        assert_eq!(parsed.pending, blueprint.pending);
    }

    #[test]
    fn test_activity_kinds_parse() {
        for kind in ActivityKind::ALL {
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        ActivityKind, DeliveryMode, LocationProvider, LocationSample, ManualEntry,
        PermissionStatus, PersistOutcome, SignalStatus, StopRequest, StoreError, TrackerError,
        TrackingState,
    };
    use location::{MockLocationProvider, MockProviderConfig};
    use persistence::{BackgroundRelay, MemoryQueue, MemoryStore, RecordCodec, SessionPersister};
    use session_controller::{ControllerSettings, SessionController};

    const T0: i64 = 1_700_000_000_000;

    fn fix(lon: f64, offset_ms: i64) -> LocationSample {
        LocationSample::new(0.0, lon, T0 + offset_ms).with_accuracy(5.0)
    }

    fn a() -> LocationSample {
        fix(0.0, 0)
    }
    fn b() -> LocationSample {
        fix(0.001, 10_000)
    }
    fn c() -> LocationSample {
        fix(0.01, 10_100)
    }
    fn d() -> LocationSample {
        fix(0.002, 20_000)
    }

    struct Harness {
        provider: Arc<MockLocationProvider>,
        store: MemoryStore,
        controller: SessionController,
    }

    fn harness_with(provider: MockLocationProvider) -> Harness {
        let provider = Arc::new(provider);
        let store = MemoryStore::new("remote");
        let persister = SessionPersister::new(
            store.clone(),
            Arc::new(MemoryQueue::new(16).unwrap()),
            RecordCodec::default(),
        );
        let relay = BackgroundRelay::new(
            Arc::new(MemoryQueue::new(500).unwrap()),
            RecordCodec::default(),
        );
        let controller = SessionController::spawn(
            Arc::clone(&provider),
            persister,
            relay,
            ControllerSettings::default(),
        );
        Harness {
            provider,
            store,
            controller,
        }
    }

    fn harness() -> Harness {
        harness_with(MockLocationProvider::granted(a()))
    }

    /// Emit in foreground and wait until the controller has applied it
    async fn emit(h: &Harness, sample: LocationSample) {
        assert!(h.provider.emit(sample), "nothing watching in foreground");
        h.controller.metrics().await.unwrap();
    }

    /// Drive A, B, C, D with their real spacing: 10 s, 0.1 s, 9.9 s
    async fn drive_abcd(h: &Harness) {
        h.controller.start(ActivityKind::Run).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        emit(h, b()).await;
        tokio::time::advance(Duration::from_millis(100)).await;
        emit(h, c()).await;
        tokio::time::advance(Duration::from_millis(9_900)).await;
        emit(h, d()).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_abcd_session_excludes_jump() {
        let h = harness();
        drive_abcd(&h).await;

        let live = h.controller.live();
        assert_eq!(live.state, TrackingState::Tracking);
        assert_eq!(live.route_points, 3);
        assert_eq!(live.status, Some(SignalStatus::Active));

        let report = h
            .controller
            .stop(StopRequest::named("Track loop"))
            .await
            .unwrap();
        let session = &report.session;

        let expected = [a(), b(), d()];
        assert_eq!(session.route.len(), 3);
        for (point, sample) in session.route.iter().zip(expected.iter()) {
            assert_eq!(point.timestamp_ms, sample.timestamp_ms);
            assert_eq!(point.longitude, sample.longitude);
        }
        assert!((session.distance_m - 222.39).abs() < 0.1, "{}", session.distance_m);
        assert_eq!(session.duration_s, 20);
        assert!((session.average_speed_kmh - 40.03).abs() < 0.05);
        assert_eq!(session.name, "Track loop");
        assert!(!session.manual_entry);

        assert_eq!(report.record_id(), Some(session.id.as_str()));
        assert_eq!(h.store.sessions(), vec![session.clone()]);
        assert_eq!(h.controller.state(), TrackingState::Idle);
        assert!(!h.provider.is_watching(DeliveryMode::Foreground));
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_name_gets_default() {
        let h = harness();
        h.controller.start(ActivityKind::Bike).await.unwrap();
        let report = h.controller.stop(StopRequest::default()).await.unwrap();

        let session = report.session;
        let expected = format!("Ride on {}", session.activity_date.format("%Y-%m-%d"));
        assert_eq!(session.name, expected);
        assert_eq!(session.route.len(), 1);
        assert_eq!(session.distance_m, 0.0);
        assert_eq!(session.average_speed_kmh, 0.0);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_store_queues_then_retries() {
        let h = harness();
        h.store.fail_next(StoreError::expired("token revoked"));
        drive_abcd(&h).await;

        let report = h.controller.stop(StopRequest::named("Queued")).await.unwrap();
        assert!(matches!(
            report.outcome,
            PersistOutcome::QueuedForRetry { .. }
        ));
        assert_eq!(report.record_id(), None);
        assert!(h.store.sessions().is_empty());

        let pending = h.controller.pending_writes().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].session, report.session);
        assert_eq!(pending[0].attempts, 1);
        assert!(pending[0].last_error.contains("token revoked"));

        let retry = h.controller.retry_pending().await.unwrap();
        assert_eq!(retry.persisted, vec![report.session.id.clone()]);
        assert_eq!(retry.requeued, 0);
        assert!(h.controller.pending_writes().await.unwrap().is_empty());
        assert_eq!(h.store.sessions(), vec![report.session]);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_store_failure_returns_session() {
        let h = harness();
        h.store.fail_next(StoreError::unavailable("connection reset"));
        drive_abcd(&h).await;

        let err = h
            .controller
            .stop(StopRequest::named("Lost?"))
            .await
            .unwrap_err();
        let TrackerError::SaveFailed { reason, session } = err else {
            panic!("expected SaveFailed, got {err:?}");
        };
        assert!(reason.contains("connection reset"));
        assert_eq!(session.route.len(), 3);
        assert_eq!(session.name, "Lost?");

        // Not queued, and the controller is ready for the next session
        assert!(h.controller.pending_writes().await.unwrap().is_empty());
        assert_eq!(h.controller.state(), TrackingState::Idle);
        h.controller.start(ActivityKind::Run).await.unwrap();
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_keeps_failing_writes() {
        let h = harness();
        h.store.fail_next(StoreError::expired("expired"));
        h.controller.start(ActivityKind::Walk).await.unwrap();
        h.controller.stop(StopRequest::default()).await.unwrap();

        h.store.fail_always(StoreError::unavailable("offline"));
        let retry = h.controller.retry_pending().await.unwrap();
        assert!(retry.persisted.is_empty());
        assert_eq!(retry.requeued, 1);

        let pending = h.controller.pending_writes().await.unwrap();
        assert_eq!(pending[0].attempts, 2);
        assert!(pending[0].last_error.contains("offline"));
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_leaves_nothing_behind() {
        let h = harness();
        h.controller.start(ActivityKind::Hike).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        emit(&h, b()).await;
        h.controller.suspend().await.unwrap();
        assert!(h.provider.emit_background(d()));

        h.controller.discard().await.unwrap();
        assert_eq!(h.controller.state(), TrackingState::Idle);
        assert_eq!(h.controller.live(), contracts::LiveMetrics::default());
        assert!(!h.provider.is_watching(DeliveryMode::Foreground));
        assert!(!h.provider.is_watching(DeliveryMode::Background));
        assert_eq!(h.store.attempts(), 0);

        // Relayed fixes of the discarded session never reach the next one
        h.controller.start(ActivityKind::Hike).await.unwrap();
        let live = h.controller.metrics().await.unwrap();
        assert_eq!(live.route_points, 1);
        assert_eq!(live.distance_m, 0.0);
        assert_eq!(live.elapsed_s, 0.0);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_fixes_drained_in_order() {
        let h = harness();
        h.controller.start(ActivityKind::Run).await.unwrap();

        h.controller.suspend().await.unwrap();
        assert!(h.controller.live().backgrounded);
        assert!(h.provider.is_watching(DeliveryMode::Background));
        assert!(!h.provider.is_watching(DeliveryMode::Foreground));

        // Delivered out of order; the relay sorts by fix time
        assert!(h.provider.emit_background(d()));
        assert!(h.provider.emit_background(c()));
        assert!(h.provider.emit_background(b()));
        assert!(!h.provider.emit(b()));

        tokio::time::advance(Duration::from_secs(20)).await;
        let report = h.controller.foreground().await.unwrap();
        assert_eq!(report.drained, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.ignored, 0);

        let live = h.controller.live();
        assert!(!live.backgrounded);
        assert_eq!(live.route_points, 3);
        assert!((live.distance_m - 222.39).abs() < 0.1);
        assert!(h.provider.is_watching(DeliveryMode::Foreground));
        assert!(!h.provider.is_watching(DeliveryMode::Background));

        // Foreground delivery picks up after the drained tail
        emit(&h, fix(0.003, 30_000)).await;
        assert_eq!(h.controller.live().route_points, 4);

        // Repeated foreground is a no-op
        let again = h.controller.foreground().await.unwrap();
        assert_eq!(again.drained, 0);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_while_backgrounded_keeps_relayed_fixes() {
        let h = harness();
        h.controller.start(ActivityKind::Walk).await.unwrap();
        h.controller.suspend().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(h.provider.emit_background(b()));

        h.controller.pause().await.unwrap();
        assert_eq!(h.controller.live().route_points, 2);
        assert!(!h.provider.is_watching(DeliveryMode::Background));
        assert!(!h.provider.emit_background(d()));

        // Paused time does not count
        tokio::time::advance(Duration::from_secs(30)).await;
        h.controller.resume().await.unwrap();
        assert!(h.provider.is_watching(DeliveryMode::Background));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(h.provider.emit_background(d()));

        let report = h.controller.stop(StopRequest::default()).await.unwrap();
        assert_eq!(report.session.route.len(), 3);
        assert_eq!(report.session.duration_s, 20);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_accrues_nothing() {
        let h = harness();
        h.controller.start(ActivityKind::Run).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        emit(&h, b()).await;
        h.controller.pause().await.unwrap();

        assert!(!h.provider.emit(d()));
        tokio::time::advance(Duration::from_secs(120)).await;

        let live = h.controller.metrics().await.unwrap();
        assert_eq!(live.state, TrackingState::Paused);
        assert_eq!(live.status, None);
        assert_eq!(live.route_points, 2);
        assert_eq!(live.elapsed_s, 10.0);
        assert!((live.distance_m - 111.195).abs() < 0.01);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied() {
        let h = harness_with(MockLocationProvider::new(MockProviderConfig {
            permission: PermissionStatus::Denied,
            initial_fix: Some(a()),
            ..Default::default()
        }));

        let err = h.controller.start(ActivityKind::Run).await.unwrap_err();
        assert!(matches!(err, TrackerError::PermissionDenied));
        assert_eq!(h.controller.state(), TrackingState::Idle);
        assert!(!h.provider.is_watching(DeliveryMode::Foreground));
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fix_timeout() {
        let h = harness_with(MockLocationProvider::new(MockProviderConfig {
            initial_fix: None,
            ..Default::default()
        }));

        let started = tokio::time::Instant::now();
        let err = h.controller.start(ActivityKind::Run).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::LocationUnavailable {
                waited_ms: 15_000,
                ..
            }
        ));
        assert!(started.elapsed() >= Duration::from_secs(15));
        assert_eq!(h.controller.state(), TrackingState::Idle);
        assert!(!h.provider.is_watching(DeliveryMode::Foreground));

        // A later attempt with a fix succeeds
        h.provider.set_initial_fix(Some(a()));
        h.controller.start(ActivityKind::Run).await.unwrap();
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_state_errors() {
        let h = harness();
        let err = h.controller.resume().await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidState {
                operation: "resume",
                ..
            }
        ));
        assert_eq!(err.to_string(), "'resume' is not valid while idle");

        h.controller.start(ActivityKind::Run).await.unwrap();
        h.controller.pause().await.unwrap();
        let err = h.controller.pause().await.unwrap_err();
        assert_eq!(err.to_string(), "'pause' is not valid while paused");

        // Backgrounding with no session is harmless
        h.controller.discard().await.unwrap();
        assert!(h.controller.suspend().await.is_ok());
        assert_eq!(h.controller.foreground().await.unwrap().drained, 0);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_goes_stale_then_recovers() {
        let h = harness();
        h.controller.start(ActivityKind::Run).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(
            h.controller.metrics().await.unwrap().status,
            Some(SignalStatus::Stale)
        );

        emit(&h, fix(0.001, 61_000)).await;
        assert_eq!(h.controller.live().status, Some(SignalStatus::Active));
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_persisted() {
        let h = harness();
        let start_time = chrono::DateTime::parse_from_rfc3339("2024-06-01T07:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let report = h
            .controller
            .submit_manual(ManualEntry {
                kind: ActivityKind::Paddleboard,
                name: String::new(),
                start_time,
                duration_s: 1800,
                distance_m: 5000.0,
                activity_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
                notes: "calm water".to_string(),
                photos: Vec::new(),
            })
            .await
            .unwrap();

        let session = &report.session;
        assert!(session.manual_entry);
        assert!(session.route.is_empty());
        assert_eq!(session.name, "Paddle on 2024-06-01");
        assert!((session.average_speed_kmh - 10.0).abs() < 1e-9);
        assert_eq!(session.end_time - session.start_time, chrono::Duration::seconds(1800));
        assert_eq!(h.store.sessions().len(), 1);

        // Manual entries do not disturb the tracking lifecycle
        assert_eq!(h.controller.state(), TrackingState::Idle);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_entry_overflowing_duration_keeps_controller_alive() {
        let h = harness();
        let err = h
            .controller
            .submit_manual(ManualEntry {
                kind: ActivityKind::Run,
                name: String::new(),
                start_time: chrono::Utc::now(),
                duration_s: 10_000_000_000_000,
                distance_m: 1000.0,
                activity_date: None,
                notes: String::new(),
                photos: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(&err, TrackerError::InvalidSession { field, .. } if field == "duration_s"),
            "got: {err}"
        );
        assert!(h.store.sessions().is_empty());

        h.controller.start(ActivityKind::Run).await.unwrap();
        assert_eq!(h.controller.state(), TrackingState::Tracking);
        h.controller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_session_stays_bounded() {
        let h = harness();
        h.controller.start(ActivityKind::Bike).await.unwrap();

        // ~4.45 m per fix, 1 s apart
        let step = 0.00004;
        for i in 1..=1500i64 {
            assert!(h.provider.emit(fix(step * i as f64, i * 1000)));
            if i % 100 == 0 {
                h.controller.metrics().await.unwrap();
            }
        }
        tokio::time::advance(Duration::from_secs(1500)).await;

        let report = h.controller.stop(StopRequest::default()).await.unwrap();
        let route = &report.session.route;
        assert!(route.len() <= 1000, "route holds {} points", route.len());
        assert_eq!(route[0].timestamp_ms, T0);
        assert_eq!(route.last().unwrap().timestamp_ms, T0 + 1_500_000);
        assert!(route.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));

        // Distance is accumulated over every accepted fix, not the kept points
        let expected = 1500.0 * step.to_radians() * 6_371_000.0;
        assert!((report.session.distance_m - expected).abs() < 1.0);
        h.controller.shutdown().await;
    }
}

#[cfg(test)]
mod persistence_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActivityKind, LocationSample, PersistOutcome, StopRequest, StoreError, TrackerBlueprint,
    };
    use location::MockLocationProvider;
    use persistence::{open_queue, BackgroundRelay, MemoryStore, RecordCodec, SessionPersister};
    use session_controller::{ControllerSettings, SessionController};

    fn blueprint(dir: &std::path::Path, format: &str) -> TrackerBlueprint {
        let toml = format!(
            r#"
[relay]
path = "{dir}/relay.queue"
capacity = 100
format = "{format}"

[pending]
path = "{dir}/pending.queue"
capacity = 10
format = "{format}"
"#,
            dir = dir.display()
        );
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    fn spawn(blueprint: &TrackerBlueprint, store: MemoryStore) -> SessionController {
        let persister = SessionPersister::new(
            store,
            open_queue(&blueprint.pending).unwrap(),
            RecordCodec::new(blueprint.pending.format),
        );
        let relay = BackgroundRelay::new(
            open_queue(&blueprint.relay).unwrap(),
            RecordCodec::new(blueprint.relay.format),
        );
        let provider = Arc::new(MockLocationProvider::granted(
            LocationSample::new(47.6062, -122.3321, 1_700_000_000_000).with_accuracy(4.0),
        ));
        SessionController::spawn(
            provider,
            persister,
            relay,
            ControllerSettings::from_blueprint(blueprint),
        )
    }

    async fn pending_survives_restart(format: &str) {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint(dir.path(), format);

        let offline = MemoryStore::new("remote");
        offline.fail_always(StoreError::expired("session expired"));
        let controller = spawn(&blueprint, offline);
        controller.start(ActivityKind::Walk).await.unwrap();
        let report = controller
            .stop(StopRequest::named("Evening walk"))
            .await
            .unwrap();
        assert!(matches!(
            report.outcome,
            PersistOutcome::QueuedForRetry { .. }
        ));
        controller.shutdown().await;

        // New process, store reachable again
        let online = MemoryStore::new("remote");
        let controller = spawn(&blueprint, online.clone());
        let pending = controller.pending_writes().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].session.name, "Evening walk");

        let retry = controller.retry_pending().await.unwrap();
        assert_eq!(retry.persisted.len(), 1);
        assert_eq!(online.sessions()[0].id, report.session.id);
        controller.shutdown().await;

        let reopened = open_queue(&blueprint.pending).unwrap();
        assert!(reopened.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_survives_restart_json() {
        pending_survives_restart("json").await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_survives_restart_bincode() {
        pending_survives_restart("bincode").await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_relay_cleared_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint(dir.path(), "json");

        // Leftover from a crashed session
        let relay = BackgroundRelay::new(
            open_queue(&blueprint.relay).unwrap(),
            RecordCodec::default(),
        );
        relay
            .record(&LocationSample::new(47.6070, -122.3321, 1_700_000_010_000).with_accuracy(4.0))
            .unwrap();
        drop(relay);

        let controller = spawn(&blueprint, MemoryStore::new("remote"));
        controller.start(ActivityKind::Run).await.unwrap();
        controller.suspend().await.unwrap();
        let report = controller.foreground().await.unwrap();
        assert_eq!(report.drained, 0);
        assert_eq!(controller.live().route_points, 1);
        controller.shutdown().await;
    }
}

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ActivityKind, EngineConfig, GeoCoord, StopRequest};
    use location::{synthetic_track, MockLocationProvider};
    use observability::TrackingMetricsAggregator;
    use persistence::{BackgroundRelay, MemoryQueue, MemoryStore, RecordCodec, SessionPersister};
    use session_controller::{ControllerSettings, SessionController};
    use track_engine::TrackEngine;

    const ORIGIN: GeoCoord = GeoCoord::new(47.6062, -122.3321);

    /// Controller output matches a bare engine fed the same fixes
    #[tokio::test(start_paused = true)]
    async fn test_controller_matches_engine() {
        let mut track = synthetic_track(ORIGIN, 30, 4.0, 1000, 1_700_000_000_000);
        // Noise the filter must drop
        track[10].accuracy_m = Some(120.0);
        track[20].latitude += 0.05;

        let mut engine = TrackEngine::new(EngineConfig::default());
        let accepted = engine.extend(track.iter());
        assert_eq!(accepted, 28);

        let provider = Arc::new(MockLocationProvider::granted(track[0]));
        let store = MemoryStore::new("remote");
        let controller = SessionController::spawn(
            Arc::clone(&provider),
            SessionPersister::new(
                store.clone(),
                Arc::new(MemoryQueue::new(4).unwrap()),
                RecordCodec::default(),
            ),
            BackgroundRelay::new(
                Arc::new(MemoryQueue::new(64).unwrap()),
                RecordCodec::default(),
            ),
            ControllerSettings::default(),
        );

        let mut live = controller.subscribe();
        let aggregate = tokio::spawn(async move {
            let mut aggregator = TrackingMetricsAggregator::new();
            while live.changed().await.is_ok() {
                aggregator.update(&live.borrow_and_update());
            }
            aggregator.summary()
        });

        controller.start(ActivityKind::Run).await.unwrap();
        let delivered = provider
            .simulate(track[1..].to_vec(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(delivered, 29);

        let report = controller.stop(StopRequest::default()).await.unwrap();
        controller.shutdown().await;
        let summary = aggregate.await.unwrap();

        let session = report.session;
        assert_eq!(session.route, engine.route());
        assert!((session.distance_m - engine.distance_m()).abs() < 1e-9);
        assert!((session.distance_m - 29.0 * 4.0).abs() < 0.5);
        assert_eq!(session.duration_s, 29);
        assert_eq!(store.sessions().len(), 1);

        // The watch channel may coalesce the final updates
        assert!(summary.updates > 0);
        assert!((1..=28).contains(&summary.route_points));
        assert!(summary.distance_m <= session.distance_m + 1e-9);
    }
}
