//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 会话、持久化与信号状态指标
//!
//! ## 使用示例
//!
//! ```ignore
//! observability::init()?;
//!
//! let mut agg = observability::TrackingMetricsAggregator::new();
//! while rx.changed().await.is_ok() {
//!     agg.update(&rx.borrow());
//! }
//! println!("{}", agg.summary());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    describe_metrics, record_pending_depth, record_persist_latency_ms, record_relay_depth, record_retry,
    record_session_finished, record_signal_status, LiveSpeedStats, TrackingMetricsAggregator,
    TrackingSummary,
};

/// 初始化可观测性（Tracing + Prometheus）
///
/// - Tracing: JSON 格式，支持 RUST_LOG 环境变量
/// - Prometheus: 监听 0.0.0.0:9464
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(9464),
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_prometheus(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "tracker observability ready"
    );

    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由 CLI 初始化的场景。
pub fn init_metrics_only(port: u16) -> Result<()> {
    install_prometheus(port)
}

fn install_prometheus(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .set_buckets_for_metric(
            Matcher::Full("tracker_session_distance_m".to_string()),
            DISTANCE_BUCKETS_M,
        )
        .context("Invalid histogram buckets")?
        .set_buckets_for_metric(
            Matcher::Full("tracker_persist_latency_ms".to_string()),
            LATENCY_BUCKETS_MS,
        )
        .context("Invalid histogram buckets")?
        .install()
        .context("Failed to install Prometheus recorder")?;

    crate::metrics::describe_metrics();
    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// 会话距离直方图分桶 (m)
const DISTANCE_BUCKETS_M: &[f64] = &[
    500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 21_097.5, 42_195.0, 100_000.0,
];

/// 写入延迟直方图分桶 (ms)
const LATENCY_BUCKETS_MS: &[f64] = &[1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, Some(9464));
        assert!(matches!(config.log_format, LogFormat::Json));
        assert_eq!(config.default_log_level, "info");
    }

    #[test]
    fn test_buckets_sorted() {
        for buckets in [DISTANCE_BUCKETS_M, LATENCY_BUCKETS_MS] {
            assert!(buckets.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
