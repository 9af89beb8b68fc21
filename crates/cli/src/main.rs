//! # Activity Tracker CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 回放/模拟轨迹驱动的记录会话
//! - 待重试写入队列的查看与重试
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::Layer;

use cli::{Cli, Commands};
use commands::{run_info, run_pending, run_tracking, run_validate};
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "activity tracker starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_tracking(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Pending(args) => run_pending(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e:#}");
            exit_code(&e)
        }
    }
}

/// 2 = bad invocation or configuration, 3 = activity not saved
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.chain().find_map(|cause| cause.downcast_ref::<CliError>()) {
        Some(CliError::ConfigNotFound { .. } | CliError::NoFixSource) => ExitCode::from(2),
        Some(CliError::SaveFailed { .. }) => ExitCode::from(3),
        None => ExitCode::FAILURE,
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let fmt_layer = match cli.log_format {
        cli::LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        cli::LogFormat::Pretty => fmt::layer().pretty().boxed(),
        cli::LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
