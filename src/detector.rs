//! Stateful anomaly detector.
//!
//! Compares each snapshot against the per-pid history and classifies every
//! process with three independent, non-exclusive rules:
//!
//! 1. CPU breach — CPU percent over the elapsed sampling interval, derived
//!    from the cumulative CPU-time delta, strictly above the threshold.
//! 2. Memory breach — resident memory strictly above the threshold.
//! 3. Growth breach — memory delta against the prior sample strictly above
//!    the growth threshold.
//!
//! The CPU and growth rules need a prior sample of the same process
//! incarnation; a first observation never fires them. Every record is
//! written into history after evaluation, whether or not it triggered.
//! This component returns findings or an empty list, never an error.

use crate::history::{HistoryEntry, HistoryStore};
use crate::process::{ProcessRecord, Snapshot};
use serde::Serialize;
use std::fmt;

/// Immutable detection thresholds for one monitor instance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Thresholds {
    /// CPU percent of one sampling interval.
    pub cpu_percent: f64,
    /// Resident memory in MB.
    pub memory_mb: u64,
    /// Memory growth in MB between consecutive samples.
    pub growth_mb: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 70.0,
            memory_mb: 400,
            growth_mb: 100,
        }
    }
}

/// One triggered rule, with the measured value that tripped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Reason {
    HighCpu { percent: f64 },
    HighMemory { memory_mb: u64 },
    RapidGrowth { grown_mb: f64 },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::HighCpu { percent } => write!(f, "high CPU ({percent:.1}%)"),
            Reason::HighMemory { memory_mb } => write!(f, "high memory ({memory_mb} MB)"),
            Reason::RapidGrowth { grown_mb } => {
                write!(f, "rapid memory growth (+{grown_mb:.1} MB)")
            }
        }
    }
}

/// Structured anomaly report for one process in one sample.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub pid: u32,
    pub name: String,
    /// Triggered rules in evaluation order; never empty.
    pub reasons: Vec<Reason>,
    /// CPU percent over the elapsed interval; None on first observation.
    pub cpu_percent: Option<f64>,
    /// Resident memory in MB at sample time.
    pub memory_mb: u64,
}

/// Snapshot-over-snapshot classifier owning the history store.
#[derive(Debug, Default)]
pub struct Detector {
    thresholds: Thresholds,
    history: HistoryStore,
}

impl Detector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            history: HistoryStore::new(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Classify every record in the snapshot and update history.
    ///
    /// Findings come back in snapshot iteration order, one per process that
    /// triggered at least one rule. An empty list is the normal "no
    /// anomalies" result.
    pub fn detect(&mut self, snapshot: &Snapshot) -> Vec<Finding> {
        let mut findings = Vec::new();

        for record in snapshot {
            if let Some(finding) = self.evaluate(record) {
                findings.push(finding);
            }
            // History always reflects the latest sample, triggered or not,
            // measured or not.
            self.history.put(record.pid, HistoryEntry::from(record));
        }

        findings
    }

    fn evaluate(&self, record: &ProcessRecord) -> Option<Finding> {
        if !record.measured {
            return None;
        }

        let prior = self.history.prior_for(record);
        let cpu_percent = prior.and_then(|p| interval_cpu_percent(record, p));
        let memory_mb = record.memory_kb / 1024;

        let mut reasons = Vec::new();

        if let Some(percent) = cpu_percent {
            if percent > self.thresholds.cpu_percent {
                reasons.push(Reason::HighCpu { percent });
            }
        }

        if memory_mb > self.thresholds.memory_mb {
            reasons.push(Reason::HighMemory { memory_mb });
        }

        if let Some(prior) = prior.filter(|p| p.measured) {
            let grown_mb =
                (record.memory_kb as i64 - prior.memory_kb as i64) as f64 / 1024.0;
            if grown_mb > self.thresholds.growth_mb as f64 {
                reasons.push(Reason::RapidGrowth { grown_mb });
            }
        }

        if reasons.is_empty() {
            return None;
        }

        Some(Finding {
            pid: record.pid,
            name: record.name.clone(),
            reasons,
            cpu_percent,
            memory_mb,
        })
    }
}

/// CPU percent of the interval between the prior and current sample:
/// `(cur_cpu_secs - prior_cpu_secs) / elapsed * 100`.
///
/// None when the prior sample is unmeasured or no time has elapsed (the
/// rate is undefined, not zero).
fn interval_cpu_percent(record: &ProcessRecord, prior: &HistoryEntry) -> Option<f64> {
    if !prior.measured {
        return None;
    }
    let elapsed = (record.timestamp - prior.timestamp).num_milliseconds() as f64 / 1000.0;
    if elapsed <= 0.0 {
        return None;
    }
    let delta = (record.cpu_time_seconds - prior.cpu_time_seconds).max(0.0);
    Some(delta / elapsed * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(pid: u32, cpu_secs: f64, mem_kb: u64) -> ProcessRecord {
        ProcessRecord {
            pid,
            start_time_ticks: 1000,
            name: format!("proc-{pid}"),
            cpu_time_seconds: cpu_secs,
            memory_kb: mem_kb,
            measured: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            Reason::HighCpu { percent: 85.0 }.to_string(),
            "high CPU (85.0%)"
        );
        assert_eq!(
            Reason::HighMemory { memory_mb: 500 }.to_string(),
            "high memory (500 MB)"
        );
        assert_eq!(
            Reason::RapidGrowth { grown_mb: 150.0 }.to_string(),
            "rapid memory growth (+150.0 MB)"
        );
    }

    #[test]
    fn test_interval_cpu_percent_math() {
        let mut prior_rec = record(1, 10.0, 1000);
        prior_rec.timestamp = Utc::now() - Duration::seconds(2);
        let prior = HistoryEntry::from(&prior_rec);

        // 2 extra CPU seconds over a 2 second gap: 100%
        let mut current = record(1, 12.0, 1000);
        current.timestamp = prior_rec.timestamp + Duration::seconds(2);
        let pct = interval_cpu_percent(&current, &prior).expect("rate");
        assert!((pct - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_interval_cpu_percent_zero_elapsed_is_undefined() {
        let prior_rec = record(1, 10.0, 1000);
        let prior = HistoryEntry::from(&prior_rec);
        let mut current = record(1, 12.0, 1000);
        current.timestamp = prior_rec.timestamp;
        assert!(interval_cpu_percent(&current, &prior).is_none());
    }

    #[test]
    fn test_unmeasured_record_triggers_nothing_but_updates_history() {
        let mut detector = Detector::new(Thresholds::default());
        let mut rec = record(5, 0.0, 10_000_000);
        rec.measured = false;

        let findings = detector.detect(&vec![rec]);
        assert!(findings.is_empty());
        assert_eq!(detector.history().len(), 1);
    }
}
