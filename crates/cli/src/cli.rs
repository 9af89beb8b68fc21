//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ActivityKind;
use std::path::PathBuf;

/// Activity Tracker - GPS activity tracking engine
#[derive(Parser, Debug)]
#[command(
    name = "activity-tracker",
    author,
    version,
    about = "GPS activity tracking engine",
    long_about = "Turns a stream of GPS fixes into a denoised, bounded route with distance,\n\
                  speed and active-time metrics, then saves the finished activity.\n\n\
                  Fixes come from a recorded JSONL track or a simulated straight-line route."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ACTIVITY_TRACKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ACTIVITY_TRACKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record an activity from a replayed or simulated track
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Inspect or retry activities waiting in the pending-write queue
    Pending(PendingArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "ACTIVITY_TRACKER_CONFIG"
    )]
    pub config: PathBuf,

    /// Activity kind (bike, run, walk, hike, paddleboard, climb, other)
    #[arg(short, long, default_value = "run")]
    pub kind: ActivityKind,

    /// Activity name (blank = "<Kind> on <date>")
    #[arg(long)]
    pub name: Option<String>,

    /// Replay a recorded JSONL track of location samples
    #[arg(long, conflicts_with = "simulate")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Simulate a straight track with this many fixes, one per second
    #[arg(long)]
    pub simulate: Option<usize>,

    /// Meters between simulated fixes
    #[arg(long, default_value = "3.0")]
    pub step_m: f64,

    /// Stop after this many seconds (0 = run until the track ends)
    #[arg(long, default_value = "0", env = "ACTIVITY_TRACKER_MAX_DURATION")]
    pub max_duration: u64,

    /// Validate configuration and exit without tracking
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ACTIVITY_TRACKER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `pending` command
#[derive(Parser, Debug)]
pub struct PendingArgs {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "config.toml",
        global = true,
        env = "ACTIVITY_TRACKER_CONFIG"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: PendingCommand,
}

#[derive(Subcommand, Debug)]
pub enum PendingCommand {
    /// List queued activities without removing them
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-attempt every queued write once
    Retry,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
