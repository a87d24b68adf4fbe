//! Procfs-backed snapshot source.
//!
//! Enumerates numeric entries under /proc and reads, per process, the name
//! and CPU times from `stat` and the resident set size from `status`.
//! The root directory is injectable so tests can point the source at a
//! fabricated tree.
//!
//! Failure containment: nothing in here propagates an error to the caller.
//! An unreadable root yields an empty snapshot, a vanished or malformed
//! process is skipped, and an access-denied process is emitted zero-filled
//! with `measured = false`.

use crate::config::Config;
use crate::process::record::{ProcessRecord, Snapshot, SnapshotSource};
use chrono::Utc;
use once_cell::sync::Lazy;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Per-process collection failures. All variants are contained inside the
/// snapshot source; callers only ever see degraded data.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot open process table at {path}: {source}")]
    EnumerationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("access denied for pid {pid}: {source}")]
    AccessDenied {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed stat record for pid {pid}")]
    Malformed { pid: u32 },

    #[error("process {pid} vanished during enumeration")]
    Vanished { pid: u32 },
}

/// Fields extracted from one `/proc/<pid>/stat` line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatFields {
    pub name: String,
    pub cpu_time_seconds: f64,
    pub start_time_ticks: u64,
}

/// Parse a `/proc/<pid>/stat` line.
///
/// The comm field sits between the first `(` and the *last* `)` — process
/// names may themselves contain spaces and parentheses, so naive
/// whitespace splitting is wrong. The fields after the name are located at
/// fixed offsets: with `rest[0]` being the state (overall field 3), utime
/// and stime are overall fields 14/15 and starttime is field 22.
pub fn parse_stat_line(line: &str) -> Option<StatFields> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let name = line[open + 1..close].to_string();

    let rest: Vec<&str> = line[close + 1..].split_whitespace().collect();
    if rest.len() <= 19 {
        return None;
    }

    let utime: u64 = rest[11].parse().ok()?;
    let stime: u64 = rest[12].parse().ok()?;
    let start_time_ticks: u64 = rest[19].parse().ok()?;

    Some(StatFields {
        name,
        cpu_time_seconds: (utime + stime) as f64 / *CLK_TCK,
        start_time_ticks,
    })
}

/// Read the resident set size in KiB from `/proc/<pid>/status`.
///
/// Returns None when the file or the VmRSS line is absent (kernel threads
/// have no VmRSS) or unreadable.
pub fn read_rss_kb(proc_path: &Path) -> Option<u64> {
    let content = fs::read_to_string(proc_path.join("status")).ok()?;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest.split_whitespace().next()?.parse().ok();
        }
    }
    None
}

/// Snapshot source reading from a procfs-style directory tree.
pub struct ProcfsSource {
    root: PathBuf,
    max_processes: Option<usize>,
    include_names: Option<Vec<String>>,
    exclude_names: Option<Vec<String>>,
}

impl ProcfsSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_processes: None,
            include_names: None,
            exclude_names: None,
        }
    }

    /// Build a source from the effective configuration (proc root, process
    /// cap, and name filters).
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            root: cfg.effective_proc_root(),
            max_processes: cfg.max_processes,
            include_names: cfg.include_names.clone(),
            exclude_names: cfg.exclude_names.clone(),
        }
    }

    pub fn with_max_processes(mut self, max: Option<usize>) -> Self {
        self.max_processes = max;
        self
    }

    pub fn with_name_filters(
        mut self,
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> Self {
        self.include_names = include;
        self.exclude_names = exclude;
        self
    }

    /// Name filter: exclude takes priority over include.
    fn should_include(&self, name: &str) -> bool {
        if let Some(ex) = &self.exclude_names {
            if ex.iter().any(|s| name.contains(s)) {
                return false;
            }
        }
        if let Some(inc) = &self.include_names {
            if !inc.is_empty() {
                return inc.iter().any(|s| name.contains(s));
            }
        }
        true
    }

    fn read_record(&self, pid: u32, proc_path: &Path) -> Result<ProcessRecord, SnapshotError> {
        let stat = match fs::read_to_string(proc_path.join("stat")) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::Vanished { pid })
            }
            Err(e) => return Err(SnapshotError::AccessDenied { pid, source: e }),
        };

        let fields = parse_stat_line(&stat).ok_or(SnapshotError::Malformed { pid })?;
        let rss_kb = read_rss_kb(proc_path);

        Ok(ProcessRecord {
            pid,
            start_time_ticks: fields.start_time_ticks,
            name: fields.name,
            cpu_time_seconds: fields.cpu_time_seconds,
            memory_kb: rss_kb.unwrap_or(0),
            measured: rss_kb.is_some(),
            timestamp: Utc::now(),
        })
    }

    /// A record for a process whose details could not be read at all.
    /// Emitted instead of dropping the pid so downstream can distinguish
    /// "measured zero" from "unmeasurable".
    fn unmeasured_record(pid: u32) -> ProcessRecord {
        ProcessRecord {
            pid,
            start_time_ticks: 0,
            name: String::new(),
            cpu_time_seconds: 0.0,
            memory_kb: 0,
            measured: false,
            timestamp: Utc::now(),
        }
    }
}

impl SnapshotSource for ProcfsSource {
    fn snapshot(&self) -> Snapshot {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    "{}",
                    SnapshotError::EnumerationUnavailable {
                        path: self.root.clone(),
                        source: e,
                    }
                );
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };

            match self.read_record(pid, &entry.path()) {
                Ok(rec) => {
                    if self.should_include(&rec.name) {
                        out.push(rec);
                    }
                }
                Err(err @ SnapshotError::AccessDenied { .. }) => {
                    debug!("{err}");
                    out.push(Self::unmeasured_record(pid));
                }
                Err(err) => {
                    // Vanished or malformed: skipped, not an abort.
                    debug!("{err}");
                }
            }

            if let Some(max) = self.max_processes {
                if out.len() >= max {
                    break;
                }
            }
        }
        out
    }
}
