//! procguard — host-level anomaly detector for per-process resource usage.
//!
//! Periodically enumerates operating-system processes, measures their CPU
//! and resident memory, and flags processes whose usage exceeds configured
//! thresholds or whose memory grows abnormally fast between samples.
//!
//! The core is two pieces: a [`process::SnapshotSource`] producing
//! normalized [`process::ProcessRecord`]s, and a stateful
//! [`detector::Detector`] that compares each snapshot against the per-pid
//! [`history::HistoryStore`] and emits structured
//! [`detector::Finding`]s. Everything else (CLI, config, report rendering,
//! the scheduler loop) drives or consumes those two.
//!
//! # Usage
//!
//! ```rust,no_run
//! use procguard::detector::{Detector, Thresholds};
//! use procguard::process::{ProcfsSource, SnapshotSource};
//!
//! let source = ProcfsSource::new("/proc");
//! let mut detector = Detector::new(Thresholds::default());
//!
//! let snapshot = source.snapshot();
//! for finding in detector.detect(&snapshot) {
//!     println!("pid {} ({}) flagged", finding.pid, finding.name);
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod detector;
pub mod history;
pub mod monitor;
pub mod process;
pub mod report;

// Re-export main types for convenience
pub use detector::{Detector, Finding, Reason, Thresholds};
pub use history::{HistoryEntry, HistoryStore};
pub use process::{ProcessRecord, ProcfsSource, Snapshot, SnapshotSource};
