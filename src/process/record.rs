//! Normalized process records and the snapshot source abstraction.
//!
//! A snapshot is the full set of records captured at one sampling instant.
//! Concrete enumerators (procfs today, other process-table APIs tomorrow)
//! are interchangeable behind the [`SnapshotSource`] trait.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One process as observed at a single sampling instant.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,

    /// Process start time in clock ticks since boot (stat field 22).
    /// Paired with the pid to tell a recycled pid apart from the process
    /// previously observed under the same number.
    pub start_time_ticks: u64,

    /// Short executable name as reported by the OS.
    pub name: String,

    /// Cumulative user+system CPU time in seconds since process start.
    /// This is a monotonic counter, not a rate; the detector derives a
    /// percentage from the delta between consecutive samples.
    pub cpu_time_seconds: f64,

    /// Resident set size in KiB.
    pub memory_kb: u64,

    /// False when the resource fields could not be read (access denied or
    /// absent, e.g. kernel threads without VmRSS). Unmeasured records never
    /// trigger detection rules but still update history.
    pub measured: bool,

    /// Wall-clock time of the sample.
    pub timestamp: DateTime<Utc>,
}

/// All records captured at one sampling instant. Order is unspecified.
pub type Snapshot = Vec<ProcessRecord>;

/// Capability to produce the current process snapshot.
pub trait SnapshotSource: Send + Sync {
    /// Enumerate all currently visible processes.
    ///
    /// Never fails: an unreadable process table yields an empty snapshot,
    /// and per-process failures degrade to omitted or unmeasured records.
    fn snapshot(&self) -> Snapshot;
}
