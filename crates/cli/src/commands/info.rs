//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::TrackerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    filter: FilterInfo,
    route: RouteInfo,
    location: LocationInfo,
    controller: ControllerInfo,
    relay: QueueInfo,
    pending: QueueInfo,
    store: StoreInfo,
}

#[derive(Serialize)]
struct FilterInfo {
    max_accuracy_m: f64,
    min_movement_m: f64,
    max_jump_m: f64,
    max_plausible_speed_kmh: f64,
}

#[derive(Serialize)]
struct RouteInfo {
    max_points: usize,
    recent_points: usize,
}

#[derive(Serialize)]
struct LocationInfo {
    accuracy: String,
    time_interval_ms: u64,
    distance_interval_m: f64,
    fix_timeout_ms: u64,
}

#[derive(Serialize)]
struct ControllerInfo {
    tick_interval_ms: u64,
    stale_after_s: u64,
}

#[derive(Serialize)]
struct QueueInfo {
    path: String,
    capacity: usize,
    format: String,
}

#[derive(Serialize)]
struct StoreInfo {
    name: String,
    store_type: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn queue_info(queue: &contracts::QueueConfig) -> QueueInfo {
    QueueInfo {
        path: queue.path.clone(),
        capacity: queue.capacity,
        format: format!("{:?}", queue.format),
    }
}

fn build_config_info(blueprint: &TrackerBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        filter: FilterInfo {
            max_accuracy_m: blueprint.filter.max_accuracy_m,
            min_movement_m: blueprint.filter.min_movement_m,
            max_jump_m: blueprint.filter.max_jump_m,
            max_plausible_speed_kmh: blueprint.filter.max_plausible_speed_kmh,
        },
        route: RouteInfo {
            max_points: blueprint.route.max_points,
            recent_points: blueprint.route.recent_points,
        },
        location: LocationInfo {
            accuracy: format!("{:?}", blueprint.location.accuracy),
            time_interval_ms: blueprint.location.time_interval_ms,
            distance_interval_m: blueprint.location.distance_interval_m,
            fix_timeout_ms: blueprint.location.fix_timeout_ms,
        },
        controller: ControllerInfo {
            tick_interval_ms: blueprint.controller.tick_interval_ms,
            stale_after_s: blueprint.controller.stale_after_s,
        },
        relay: queue_info(&blueprint.relay),
        pending: queue_info(&blueprint.pending),
        store: StoreInfo {
            name: blueprint.store.name.clone(),
            store_type: format!("{:?}", blueprint.store.store_type),
            params: blueprint.store.params.clone(),
        },
    }
}

fn print_config_info(blueprint: &TrackerBlueprint) {
    println!("=== Activity Tracker Configuration ===\n");

    let filter = &blueprint.filter;
    println!("Filter");
    println!("  Version: {:?}", blueprint.version);
    println!("  Max accuracy: {} m", filter.max_accuracy_m);
    println!("  Min movement: {} m", filter.min_movement_m);
    println!("  Max jump: {} m", filter.max_jump_m);
    println!("  Plausible speed: < {} km/h", filter.max_plausible_speed_kmh);

    println!("\nRoute");
    println!("  Max points: {}", blueprint.route.max_points);
    println!("  Full-resolution tail: {}", blueprint.route.recent_points);

    let location = &blueprint.location;
    println!("\nLocation");
    println!("  Accuracy: {:?}", location.accuracy);
    println!(
        "  Updates: every {} ms or {} m",
        location.time_interval_ms, location.distance_interval_m
    );
    println!("  Initial fix timeout: {} ms", location.fix_timeout_ms);

    println!("\nController");
    println!("  Tick: {} ms", blueprint.controller.tick_interval_ms);
    println!("  Stale after: {} s", blueprint.controller.stale_after_s);

    println!("\nQueues");
    for (label, queue) in [("relay", &blueprint.relay), ("pending", &blueprint.pending)] {
        println!(
            "  {}: {} ({:?}, capacity {})",
            label, queue.path, queue.format, queue.capacity
        );
    }

    let store = &blueprint.store;
    println!("\nStore");
    println!("  {} ({:?})", store.name, store.store_type);
    let mut params: Vec<_> = store.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {} = {}", key, value);
    }

    println!();
}
