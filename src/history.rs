//! Per-pid history of the most recent observed sample.
//!
//! Memory-resident for the life of the run; every detect pass overwrites
//! the entry for each pid in the snapshot. Entries are never evicted — a
//! process that exits leaves a stale entry behind, which is harmless
//! because lookups are guarded by the start-time identity check.

use crate::process::ProcessRecord;
use ahash::AHashMap as HashMap;
use chrono::{DateTime, Utc};

/// The retained slice of one prior sample, enough to compute CPU percent
/// and memory growth on the next pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub start_time_ticks: u64,
    pub cpu_time_seconds: f64,
    pub memory_kb: u64,
    pub measured: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&ProcessRecord> for HistoryEntry {
    fn from(rec: &ProcessRecord) -> Self {
        Self {
            start_time_ticks: rec.start_time_ticks,
            cpu_time_seconds: rec.cpu_time_seconds,
            memory_kb: rec.memory_kb,
            measured: rec.measured,
            timestamp: rec.timestamp,
        }
    }
}

/// Mapping from pid to its most recent observed sample.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: HashMap<u32, HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: u32) -> Option<&HistoryEntry> {
        self.entries.get(&pid)
    }

    /// Overwrite, not merge.
    pub fn put(&mut self, pid: u32, entry: HistoryEntry) {
        self.entries.insert(pid, entry);
    }

    /// The prior sample for this record, but only if it belongs to the same
    /// process incarnation. A recycled pid (same number, different start
    /// time) returns None so the first sample of the new incumbent is
    /// treated as a first observation.
    pub fn prior_for(&self, record: &ProcessRecord) -> Option<&HistoryEntry> {
        self.entries
            .get(&record.pid)
            .filter(|e| e.start_time_ticks == record.start_time_ticks)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
