//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{StoreType, TrackerBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    store: String,
    store_type: String,
    max_route_points: usize,
    pending_capacity: usize,
    relay_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    store: blueprint.store.name.clone(),
                    store_type: format!("{:?}", blueprint.store.store_type),
                    max_route_points: blueprint.route.max_points,
                    pending_capacity: blueprint.pending.capacity,
                    relay_capacity: blueprint.relay.capacity,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &TrackerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    match blueprint.store.store_type {
        StoreType::Log => warnings
            .push("store_type = log - activities are only written to the log".to_string()),
        StoreType::Memory => warnings.push(
            "store_type = memory - activities are lost when the process exits".to_string(),
        ),
        StoreType::File => {}
    }

    if blueprint.relay.capacity < 60 {
        warnings.push(format!(
            "relay.capacity = {} holds less than a minute of background fixes",
            blueprint.relay.capacity
        ));
    }

    if blueprint.filter.max_accuracy_m > 100.0 {
        warnings.push(format!(
            "filter.max_accuracy_m = {} admits cell-tower grade fixes",
            blueprint.filter.max_accuracy_m
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK  Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Store: {} ({})", summary.store, summary.store_type);
            println!("  Max route points: {}", summary.max_route_points);
            println!("  Pending capacity: {}", summary.pending_capacity);
            println!("  Relay capacity: {}", summary.relay_capacity);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("ERR Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
