//! Scheduler loop driving snapshot → detect → report on a fixed interval.
//!
//! Each enumeration runs on the blocking pool under a timeout so a hanging
//! OS call cannot stall the loop indefinitely; the inter-iteration sleep
//! races the shutdown future so cancellation takes effect promptly rather
//! than at the next iteration boundary.

use crate::cli::OutputFormat;
use crate::config::{Config, Iterations};
use crate::detector::Detector;
use crate::process::{Snapshot, SnapshotSource};
use crate::report::{self, ScanReport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runtime options for one monitoring run.
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub iterations: Iterations,
    pub snapshot_timeout: Duration,
    pub output: OutputFormat,
}

impl MonitorOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: cfg.interval(),
            iterations: cfg.effective_iterations(),
            snapshot_timeout: cfg.snapshot_timeout(),
            output: cfg.output_format(),
        }
    }
}

/// Take one snapshot on the blocking pool, bounded by the timeout.
/// A timeout or panic degrades to an empty snapshot, never an error.
pub async fn take_snapshot(source: Arc<dyn SnapshotSource>, timeout: Duration) -> Snapshot {
    let task = tokio::task::spawn_blocking(move || source.snapshot());
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            error!("snapshot task failed: {e}");
            Vec::new()
        }
        Err(_) => {
            warn!(
                "process enumeration exceeded {:.0}s, treating as empty snapshot",
                timeout.as_secs_f64()
            );
            Vec::new()
        }
    }
}

/// Run the monitor loop until the iteration budget is spent or the
/// shutdown future resolves.
pub async fn run(
    source: Arc<dyn SnapshotSource>,
    mut detector: Detector,
    opts: MonitorOptions,
    shutdown: impl Future<Output = ()>,
) {
    info!(
        "Starting monitor: cpu > {:.1}%, memory > {} MB, growth > {} MB, every {}s, {} iterations",
        detector.thresholds().cpu_percent,
        detector.thresholds().memory_mb,
        detector.thresholds().growth_mb,
        opts.interval.as_secs(),
        opts.iterations,
    );

    tokio::pin!(shutdown);
    let mut completed: u64 = 0;

    loop {
        let snapshot = take_snapshot(Arc::clone(&source), opts.snapshot_timeout).await;
        debug!("scan {}: {} processes", completed + 1, snapshot.len());

        let findings = detector.detect(&snapshot);
        if !findings.is_empty() {
            info!("scan {}: {} finding(s)", completed + 1, findings.len());
        }

        let scan_report = ScanReport::new(completed + 1, snapshot.len(), findings);
        match report::render(&scan_report, opts.output) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("failed to render report: {e}"),
        }

        completed += 1;
        if opts.iterations.is_done(completed) {
            info!("Completed {completed} scan(s), exiting");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(opts.interval) => {}
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping after {completed} scan(s)");
                break;
            }
        }
    }
}
