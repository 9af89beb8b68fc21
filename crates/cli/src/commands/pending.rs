//! `pending` command implementation.

use anyhow::{Context, Result};
use contracts::PendingWrite;
use serde::Serialize;
use tracing::info;

use crate::cli::{PendingArgs, PendingCommand};
use crate::error::CliError;
use crate::pipeline::build_persister;

/// Queued write for JSON output
#[derive(Serialize)]
struct PendingEntry {
    session_id: String,
    name: String,
    kind: String,
    distance_m: f64,
    duration_s: u64,
    queued_at: String,
    attempts: u32,
    last_error: String,
}

impl From<&PendingWrite> for PendingEntry {
    fn from(write: &PendingWrite) -> Self {
        Self {
            session_id: write.session.id.clone(),
            name: write.session.name.clone(),
            kind: write.session.kind.to_string(),
            distance_m: write.session.distance_m,
            duration_s: write.session.duration_s,
            queued_at: write.queued_at.to_rfc3339(),
            attempts: write.attempts,
            last_error: write.last_error.clone(),
        }
    }
}

/// Execute the `pending` command
pub async fn run_pending(args: &PendingArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let mut persister = build_persister(&blueprint)?;

    match args.command {
        PendingCommand::List { json } => {
            let entries: Vec<PendingEntry> = persister
                .pending()
                .context("Failed to read pending queue")?
                .iter()
                .map(PendingEntry::from)
                .collect();

            if json {
                let out = serde_json::to_string_pretty(&entries)
                    .context("Failed to serialize pending writes")?;
                println!("{}", out);
            } else if entries.is_empty() {
                println!("No pending writes in {}", blueprint.pending.path);
            } else {
                println!("Pending writes ({}):", entries.len());
                for entry in &entries {
                    println!(
                        "  - {} \"{}\" {} {:.1} m, {} attempt(s), last error: {}",
                        entry.session_id,
                        entry.name,
                        entry.kind,
                        entry.distance_m,
                        entry.attempts,
                        entry.last_error
                    );
                }
            }
        }
        PendingCommand::Retry => {
            info!(
                queued = persister.pending_len(),
                store = %blueprint.store.name,
                "Retrying pending writes"
            );
            let report = persister
                .retry_pending()
                .await
                .context("Failed to retry pending writes")?;

            println!(
                "Persisted: {}, requeued: {}, discarded: {}",
                report.persisted.len(),
                report.requeued,
                report.discarded
            );
            for id in &report.persisted {
                println!("  + {}", id);
            }
        }
    }

    Ok(())
}
