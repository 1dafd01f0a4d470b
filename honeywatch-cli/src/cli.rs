//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Honeywatch -- honey-token access log analysis.
///
/// Use `honeywatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "honeywatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the honeywatch.toml configuration file.
    #[arg(short, long, default_value = "honeywatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one analysis pass over the lookback window.
    Analyze(AnalyzeArgs),

    /// Run analysis passes on a fixed interval until Ctrl-C.
    Monitor(MonitorArgs),

    /// List stored security events, newest first.
    Events(EventsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Run one analysis pass.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Access log file or directory (default: `analysis.log_path`).
    #[arg(long)]
    pub logs: Option<PathBuf>,

    /// Lookback window in hours (default: `analysis.lookback_secs`).
    #[arg(long)]
    pub hours: Option<u64>,

    /// Store events without sending any notification.
    #[arg(long)]
    pub no_alerts: bool,

    /// End of the analysis window as RFC 3339 (default: now).
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

// ---- monitor ----

/// Run passes on a schedule.
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Access log file or directory (default: `analysis.log_path`).
    #[arg(long)]
    pub logs: Option<PathBuf>,

    /// Seconds between passes (default: `analysis.interval_secs`).
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Stop after this many passes.
    #[arg(long)]
    pub max_passes: Option<u64>,
}

// ---- events ----

/// Query the event store.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// How far back to look, in hours.
    #[arg(long, default_value_t = 24)]
    pub hours: u64,

    /// Maximum number of events (default: `store.query_limit`).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only show events at or above this severity (low, medium, high, critical).
    #[arg(long)]
    pub min_severity: Option<String>,
}

// ---- config ----

/// Manage honeywatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, analysis, detection, store, alerts, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}
