//! Report rendering for scan results.
//!
//! Consumes the structured findings list and renders it as human-readable
//! text or JSON. Formatting lives entirely here so the detector stays
//! output-agnostic.

use crate::cli::OutputFormat;
use crate::detector::Finding;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Everything the reporting sink gets from one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// 1-based scan number within this run.
    pub scan: u64,
    pub timestamp: DateTime<Utc>,
    pub processes_scanned: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn new(scan: u64, processes_scanned: usize, findings: Vec<Finding>) -> Self {
        Self {
            scan,
            timestamp: Utc::now(),
            processes_scanned,
            findings,
        }
    }
}

/// Render a report in the requested format.
pub fn render(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Suspicious Activity Report ===");
    let _ = writeln!(
        out,
        "Scan #{} at {}",
        report.scan,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Processes scanned: {}", report.processes_scanned);

    if report.findings.is_empty() {
        let _ = writeln!(out, "No suspicious activity detected.");
    } else {
        for finding in &report.findings {
            let _ = writeln!(out);
            let _ = writeln!(out, "[ALERT] PID: {} | Name: {}", finding.pid, finding.name);
            let reasons: Vec<String> = finding.reasons.iter().map(|r| r.to_string()).collect();
            let _ = writeln!(out, "  Reason: {}", reasons.join(", "));
            let cpu = match finding.cpu_percent {
                Some(p) => format!("{p:.1}%"),
                None => "n/a".into(),
            };
            let _ = writeln!(out, "  CPU: {} | Memory: {} MB", cpu, finding.memory_mb);
        }
    }

    let _ = writeln!(out, "==================================");
    out
}
