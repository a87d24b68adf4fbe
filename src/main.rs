//! procguard - version 0.1.0
//!
//! Host-level process resource anomaly detector. This is the main entry
//! point that parses arguments, handles subcommands, and drives the
//! monitor loop.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, Level};

use procguard::cli::{Args, Commands, LogLevel};
use procguard::commands::{command_check, command_config, command_scan};
use procguard::config::{resolve_config, show_config, validate_effective_config, Config};
use procguard::detector::Detector;
use procguard::monitor::{self, MonitorOptions};
use procguard::process::ProcfsSource;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config> {
    let config = resolve_config(args).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args).map_err(|e| anyhow::anyhow!(e.to_string()))?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone())
            .map_err(|e| anyhow::anyhow!(e.to_string()));
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        let config = load_validated_config(&args)?;

        return match command {
            Commands::Check => command_check(&config),
            Commands::Config { output, format } => command_config(output.clone(), format.clone()),
            Commands::Scan { verbose } => command_scan(*verbose, &config),
        };
    }

    // Monitor mode
    let config = load_validated_config(&args)?;
    setup_logging(&args);

    info!("Starting procguard");

    let source = Arc::new(ProcfsSource::from_config(&config));
    let detector = Detector::new(config.thresholds());
    let opts = MonitorOptions::from_config(&config);

    monitor::run(source, detector, opts, shutdown_signal()).await;

    info!("procguard stopped");
    Ok(())
}
