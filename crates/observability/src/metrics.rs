//! Tracker 指标收集模块
//!
//! 会话、持久化与信号状态的 Prometheus 指标，以及基于 LiveMetrics 的内存聚合。

use contracts::{ActivityKind, LiveMetrics, SignalStatus, TrackingState};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// 注册指标说明，安装 exporter 后调用一次
pub fn describe_metrics() {
    describe_counter!(
        "tracker_fixes_total",
        Unit::Count,
        "Location fixes seen by the track engine, by outcome"
    );
    describe_counter!(
        "tracker_route_compactions_total",
        Unit::Count,
        "Route buffer downsampling passes"
    );
    describe_counter!(
        "tracker_sessions_finished_total",
        Unit::Count,
        "Sessions that left the controller, by kind and outcome"
    );
    describe_counter!("tracker_retry_total", Unit::Count, "Pending-write retry results");
    describe_gauge!("tracker_pending_writes", Unit::Count, "Sessions waiting for a retry");
    describe_gauge!("tracker_relay_depth", Unit::Count, "Background fixes not yet absorbed");
    describe_gauge!(
        "tracker_signal_status",
        "0 active, 1 searching, 2 stale, 3 error, -1 not tracking"
    );
    describe_histogram!(
        "tracker_session_distance_m",
        "Distance of finished sessions in meters"
    );
    describe_histogram!(
        "tracker_persist_latency_ms",
        Unit::Milliseconds,
        "Remote store write latency"
    );
}

/// 记录会话结束
///
/// `outcome` 取值: persisted / queued / failed / discarded
pub fn record_session_finished(kind: ActivityKind, outcome: &str, distance_m: f64) {
    counter!(
        "tracker_sessions_finished_total",
        "kind" => kind.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    if outcome != "discarded" {
        histogram!("tracker_session_distance_m", "kind" => kind.as_str()).record(distance_m);
    }
}

/// 记录待重试写入队列深度
pub fn record_pending_depth(depth: usize) {
    gauge!("tracker_pending_writes").set(depth as f64);
}

/// 记录后台中继队列深度
pub fn record_relay_depth(depth: usize) {
    gauge!("tracker_relay_depth").set(depth as f64);
}

/// 记录信号状态 (-1 = 未在记录)
pub fn record_signal_status(status: Option<SignalStatus>) {
    let code = status.map(|s| f64::from(s.code())).unwrap_or(-1.0);
    gauge!("tracker_signal_status").set(code);
}

/// 记录远端写入耗时
pub fn record_persist_latency_ms(store: &str, latency_ms: f64) {
    histogram!("tracker_persist_latency_ms", "store" => store.to_string()).record(latency_ms);
}

/// 记录重试结果
pub fn record_retry(persisted: usize, requeued: usize, discarded: usize) {
    counter!("tracker_retry_total", "result" => "persisted").increment(persisted as u64);
    counter!("tracker_retry_total", "result" => "requeued").increment(requeued as u64);
    counter!("tracker_retry_total", "result" => "discarded").increment(discarded as u64);
}

/// 会话指标聚合器
///
/// 在内存中聚合 LiveMetrics 更新，便于输出运行摘要。
#[derive(Debug, Clone, Default)]
pub struct TrackingMetricsAggregator {
    /// 更新次数
    pub updates: u64,

    /// 记录中的更新次数
    pub tracking_updates: u64,

    /// 信号过期的更新次数
    pub stale_updates: u64,

    /// 信号异常的更新次数
    pub error_updates: u64,

    /// 当前速度统计 (km/h, 仅记录中)
    pub speed: LiveSpeedStats,

    /// 最近一次更新
    pub last: Option<LiveMetrics>,
}

impl TrackingMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, live: &LiveMetrics) {
        self.updates += 1;

        if live.state == TrackingState::Tracking {
            self.tracking_updates += 1;
            self.speed.record(live.current_speed_kmh);
        }
        match live.status {
            Some(SignalStatus::Stale) => self.stale_updates += 1,
            Some(SignalStatus::Error) => self.error_updates += 1,
            _ => {}
        }

        // 会话结束后回到 Idle 时保留最后一次有效数据
        if live.state != TrackingState::Idle || self.last.is_none() {
            self.last = Some(live.clone());
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> TrackingSummary {
        let last = self.last.clone().unwrap_or_default();
        TrackingSummary {
            updates: self.updates,
            stale_rate: rate(self.stale_updates, self.tracking_updates),
            error_rate: rate(self.error_updates, self.tracking_updates),
            route_points: last.route_points,
            distance_m: last.distance_m,
            elapsed_s: last.elapsed_s,
            average_speed_kmh: last.average_speed_kmh,
            max_speed_kmh: last.max_speed_kmh,
            speed: self.speed,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// 会话摘要
#[derive(Debug, Clone, Default)]
pub struct TrackingSummary {
    pub updates: u64,
    pub stale_rate: f64,
    pub error_rate: f64,
    pub route_points: usize,
    pub distance_m: f64,
    pub elapsed_s: f64,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub speed: LiveSpeedStats,
}

impl std::fmt::Display for TrackingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tracking Summary ===")?;
        writeln!(f, "Updates: {}", self.updates)?;
        writeln!(f, "Route points: {}", self.route_points)?;
        writeln!(f, "Distance: {:.1} m", self.distance_m)?;
        writeln!(f, "Elapsed: {:.1} s", self.elapsed_s)?;
        writeln!(
            f,
            "Speed (km/h): avg={:.2}, max={:.2}",
            self.average_speed_kmh, self.max_speed_kmh
        )?;
        writeln!(f, "Live speed: {}", self.speed)?;
        writeln!(
            f,
            "Signal: stale {:.2}%, error {:.2}%",
            self.stale_rate, self.error_rate
        )
    }
}

/// Live speed samples seen while tracking
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveSpeedStats {
    pub samples: u64,
    /// Samples with non-zero speed
    pub moving: u64,
    pub total_kmh: f64,
    pub peak_kmh: f64,
}

impl LiveSpeedStats {
    pub fn record(&mut self, speed_kmh: f64) {
        if !speed_kmh.is_finite() {
            return;
        }
        self.samples += 1;
        if speed_kmh > 0.0 {
            self.moving += 1;
        }
        self.total_kmh += speed_kmh;
        self.peak_kmh = self.peak_kmh.max(speed_kmh);
    }

    pub fn mean_kmh(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_kmh / self.samples as f64
        }
    }

    /// Share of samples spent moving (%)
    pub fn moving_rate(&self) -> f64 {
        rate(self.moving, self.samples)
    }
}

impl std::fmt::Display for LiveSpeedStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.samples == 0 {
            return write!(f, "no samples");
        }
        write!(
            f,
            "mean {:.2} km/h, peak {:.2} km/h, moving {:.0}% of {} samples",
            self.mean_kmh(),
            self.peak_kmh,
            self.moving_rate(),
            self.samples
        )
    }
}
