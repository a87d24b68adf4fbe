//! CLI arguments and subcommands for procguard.
//!
//! This module defines the command-line interface structure using the clap
//! library, including all flags, options, and subcommands.

use crate::config::Iterations;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procguard",
    about = "Host-level anomaly detector for per-process CPU and memory usage",
    long_about = "Host-level anomaly detector for per-process CPU and memory usage.\n\n\
                  Periodically enumerates running processes, measures their CPU and \
                  resident memory, and flags processes that exceed configured thresholds \
                  or whose memory grows abnormally fast between samples.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CPU usage threshold in percent of one sampling interval
    #[arg(long)]
    pub cpu_threshold: Option<f64>,

    /// Resident memory threshold in MB
    #[arg(long)]
    pub memory_threshold_mb: Option<u64>,

    /// Memory growth threshold in MB per sampling interval
    #[arg(long)]
    pub growth_threshold_mb: Option<u64>,

    /// Seconds to sleep between scans
    #[arg(short = 'i', long)]
    pub interval_seconds: Option<u64>,

    /// Number of scans to run, or "forever"
    #[arg(short = 'n', long)]
    pub iterations: Option<Iterations>,

    /// Upper bound in seconds for one process enumeration
    #[arg(long)]
    pub snapshot_timeout_seconds: Option<u64>,

    /// Procfs root directory (mainly for testing)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Report output format
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate process-table access and system requirements
    Check,

    /// Generate a configuration file with the defaults
    Config {
        /// Output file path (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Run a single scan and print the report
    Scan {
        /// Show every scanned process, not only findings
        #[arg(long)]
        verbose: bool,
    },
}
