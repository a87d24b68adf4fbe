//! Scan command implementation.
//!
//! Runs a single snapshot + detection pass and prints the report. With one
//! sample there is no prior history, so only the static memory threshold
//! can fire; the CPU and growth rules need consecutive samples from the
//! monitor loop.

use crate::config::Config;
use crate::detector::Detector;
use crate::process::{ProcfsSource, SnapshotSource};
use crate::report::{self, ScanReport};
use std::time::Instant;

/// Runs one scan and prints the resulting report.
pub fn command_scan(verbose: bool, config: &Config) -> anyhow::Result<()> {
    let source = ProcfsSource::from_config(config);
    let mut detector = Detector::new(config.thresholds());

    let start = Instant::now();
    let snapshot = source.snapshot();
    let duration = start.elapsed();

    if verbose {
        println!("📁 Scanned {} processes in {:.2}ms", snapshot.len(), duration.as_secs_f64() * 1000.0);
        for record in &snapshot {
            let measured = if record.measured { "" } else { " (unmeasured)" };
            println!(
                "   ├─ {} (PID: {}) — {} MB, {:.1}s CPU{}",
                record.name,
                record.pid,
                record.memory_kb / 1024,
                record.cpu_time_seconds,
                measured
            );
        }
    }

    let findings = detector.detect(&snapshot);
    let scan_report = ScanReport::new(1, snapshot.len(), findings);
    let text = report::render(&scan_report, config.output_format())?;
    println!("{text}");

    Ok(())
}
