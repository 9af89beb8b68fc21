//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{FixSource, TrackingConfig, TrackingRun};

/// Execute the `run` command
pub async fn run_tracking(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        store = %blueprint.store.name,
        store_type = ?blueprint.store.store_type,
        pending = %blueprint.pending.path,
        relay = %blueprint.relay.path,
        max_points = blueprint.route.max_points,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let source = fix_source(args)?;

    let config = TrackingConfig {
        blueprint,
        kind: args.kind,
        name: args.name.clone(),
        source,
        max_duration: if args.max_duration == 0 {
            None
        } else {
            Some(Duration::from_secs(args.max_duration))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let stats = TrackingRun::new(config)
        .run(shutdown_signal())
        .await
        .context("Tracking run failed")?;

    info!(
        outcome = %stats.outcome,
        record_id = ?stats.record_id,
        fixes = stats.fixes_delivered,
        duration_secs = stats.duration.as_secs_f64(),
        "Activity finished"
    );
    stats.print_summary();

    Ok(())
}

fn fix_source(args: &RunArgs) -> Result<FixSource, CliError> {
    match (&args.replay, args.simulate) {
        (Some(path), _) => Ok(FixSource::Replay {
            path: path.clone(),
            speed: args.speed,
        }),
        (None, Some(points)) => Ok(FixSource::Simulated {
            points,
            step_m: args.step_m,
        }),
        (None, None) => Err(CliError::NoFixSource),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::TrackerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Filter:");
    println!("  Max accuracy: {} m", blueprint.filter.max_accuracy_m);
    println!(
        "  Movement window: {} - {} m",
        blueprint.filter.min_movement_m, blueprint.filter.max_jump_m
    );
    println!(
        "  Plausible speed: < {} km/h",
        blueprint.filter.max_plausible_speed_kmh
    );
    println!(
        "\nRoute: {} points max, {} kept at full resolution",
        blueprint.route.max_points, blueprint.route.recent_points
    );
    println!(
        "\nStore: {} ({:?})",
        blueprint.store.name, blueprint.store.store_type
    );
    println!(
        "Pending queue: {} (capacity {})",
        blueprint.pending.path, blueprint.pending.capacity
    );
    println!(
        "Relay queue: {} (capacity {})",
        blueprint.relay.path, blueprint.relay.capacity
    );
    println!();
}
