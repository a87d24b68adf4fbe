//! Configuration management for procguard.
//!
//! This module handles loading, merging, and validating configuration from
//! files and CLI arguments. It supports YAML, JSON, and TOML formats, with
//! precedence CLI > config file > built-in defaults.

use crate::cli::{Args, ConfigFormat, OutputFormat};
use crate::detector::Thresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_CPU_THRESHOLD: f64 = 70.0;
pub const DEFAULT_MEMORY_THRESHOLD_MB: u64 = 400;
pub const DEFAULT_GROWTH_THRESHOLD_MB: u64 = 100;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_ITERATIONS: Iterations = Iterations::Count(10);
pub const DEFAULT_SNAPSHOT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Iteration budget for the monitor loop: a fixed count or "forever".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    Forever,
    Count(u64),
}

impl Iterations {
    pub fn is_done(&self, completed: u64) -> bool {
        match self {
            Iterations::Forever => false,
            Iterations::Count(n) => completed >= *n,
        }
    }
}

impl fmt::Display for Iterations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iterations::Forever => write!(f, "forever"),
            Iterations::Count(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Iterations {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("forever") {
            return Ok(Iterations::Forever);
        }
        s.parse::<u64>()
            .map(Iterations::Count)
            .map_err(|_| format!("expected a positive integer or \"forever\", got '{s}'"))
    }
}

impl Serialize for Iterations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Iterations::Forever => serializer.serialize_str("forever"),
            Iterations::Count(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Iterations {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(Iterations::Count(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Effective configuration. All fields optional so a partial config file
/// merges cleanly; accessors below apply the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Detection thresholds
    #[serde(alias = "cpu-threshold")]
    pub cpu_threshold: Option<f64>,
    #[serde(alias = "memory-threshold-mb")]
    pub memory_threshold_mb: Option<u64>,
    #[serde(alias = "growth-threshold-mb")]
    pub growth_threshold_mb: Option<u64>,

    // Scheduling
    #[serde(alias = "interval-seconds")]
    pub interval_seconds: Option<u64>,
    pub iterations: Option<Iterations>,
    #[serde(alias = "snapshot-timeout-seconds")]
    pub snapshot_timeout_seconds: Option<u64>,

    // Snapshot source
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,

    // Reporting
    /// "text" | "json"
    pub output: Option<String>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_threshold: Some(DEFAULT_CPU_THRESHOLD),
            memory_threshold_mb: Some(DEFAULT_MEMORY_THRESHOLD_MB),
            growth_threshold_mb: Some(DEFAULT_GROWTH_THRESHOLD_MB),
            interval_seconds: Some(DEFAULT_INTERVAL_SECONDS),
            iterations: Some(DEFAULT_ITERATIONS),
            snapshot_timeout_seconds: Some(DEFAULT_SNAPSHOT_TIMEOUT_SECONDS),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            include_names: None,
            exclude_names: None,
            max_processes: None,
            output: Some("text".into()),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_percent: self.cpu_threshold.unwrap_or(DEFAULT_CPU_THRESHOLD),
            memory_mb: self
                .memory_threshold_mb
                .unwrap_or(DEFAULT_MEMORY_THRESHOLD_MB),
            growth_mb: self
                .growth_threshold_mb
                .unwrap_or(DEFAULT_GROWTH_THRESHOLD_MB),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS))
    }

    pub fn effective_iterations(&self) -> Iterations {
        self.iterations.unwrap_or(DEFAULT_ITERATIONS)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(
            self.snapshot_timeout_seconds
                .unwrap_or(DEFAULT_SNAPSHOT_TIMEOUT_SECONDS),
        )
    }

    pub fn effective_proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.output.as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let cpu = cfg.cpu_threshold.unwrap_or(DEFAULT_CPU_THRESHOLD);
    if !cpu.is_finite() || cpu <= 0.0 {
        return Err(format!("cpu_threshold must be a positive number, got {cpu}").into());
    }

    if cfg.memory_threshold_mb == Some(0) {
        return Err("memory_threshold_mb must be greater than zero".into());
    }
    if cfg.growth_threshold_mb == Some(0) {
        return Err("growth_threshold_mb must be greater than zero".into());
    }

    if cfg.interval_seconds == Some(0) {
        return Err("interval_seconds must be at least 1".into());
    }
    if cfg.snapshot_timeout_seconds == Some(0) {
        return Err("snapshot_timeout_seconds must be at least 1".into());
    }
    if cfg.iterations == Some(Iterations::Count(0)) {
        return Err("iterations must be at least 1 (or \"forever\")".into());
    }

    if let Some(output) = cfg.output.as_deref() {
        match output {
            "text" | "json" => {}
            other => {
                return Err(
                    format!("Invalid output '{other}', expected 'text' or 'json'").into(),
                );
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(cpu) = args.cpu_threshold {
        config.cpu_threshold = Some(cpu);
    }
    if let Some(mem) = args.memory_threshold_mb {
        config.memory_threshold_mb = Some(mem);
    }
    if let Some(growth) = args.growth_threshold_mb {
        config.growth_threshold_mb = Some(growth);
    }
    if let Some(interval) = args.interval_seconds {
        config.interval_seconds = Some(interval);
    }
    if let Some(iterations) = args.iterations {
        config.iterations = Some(iterations);
    }
    if let Some(timeout) = args.snapshot_timeout_seconds {
        config.snapshot_timeout_seconds = Some(timeout);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    // Parse comma-separated include/exclude names
    if let Some(include_str) = &args.include_names {
        config.include_names = Some(
            include_str
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        );
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(
            exclude_str
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        );
    }

    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }

    if let Some(output) = args.output {
        config.output = Some(
            match output {
                OutputFormat::Text => "text",
                OutputFormat::Json => "json",
            }
            .into(),
        );
    }

    Ok(config)
}

/// Configuration loading with multiple format support, chosen by extension.
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/procguard/procguard.yaml",
            "/etc/procguard/procguard.yml",
            "/etc/procguard/procguard.json",
            "./procguard.yaml",
            "./procguard.yml",
            "./procguard.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterations_from_str() {
        assert_eq!("forever".parse::<Iterations>(), Ok(Iterations::Forever));
        assert_eq!("FOREVER".parse::<Iterations>(), Ok(Iterations::Forever));
        assert_eq!("25".parse::<Iterations>(), Ok(Iterations::Count(25)));
        assert!("sometimes".parse::<Iterations>().is_err());
        assert!("-3".parse::<Iterations>().is_err());
    }

    #[test]
    fn test_iterations_is_done() {
        assert!(!Iterations::Forever.is_done(u64::MAX));
        assert!(!Iterations::Count(10).is_done(9));
        assert!(Iterations::Count(10).is_done(10));
    }

    #[test]
    fn test_iterations_yaml_round_trip() {
        let forever: Iterations = serde_yaml::from_str("forever").expect("parse");
        assert_eq!(forever, Iterations::Forever);
        let count: Iterations = serde_yaml::from_str("12").expect("parse");
        assert_eq!(count, Iterations::Count(12));
    }

    #[test]
    fn test_defaults_are_valid() {
        validate_effective_config(&Config::default()).expect("defaults must validate");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.interval_seconds = Some(0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.cpu_threshold = Some(-1.0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.output = Some("xml".into());
        assert!(validate_effective_config(&cfg).is_err());
    }
}
