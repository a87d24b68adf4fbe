//! Process enumeration: normalized records and snapshot sources.
//!
//! - `record`: the `ProcessRecord` data model and the `SnapshotSource` trait
//! - `procfs`: the /proc-backed snapshot source for POSIX systems

pub mod procfs;
pub mod record;

// Re-export commonly used types
pub use procfs::{parse_stat_line, read_rss_kb, ProcfsSource, SnapshotError, StatFields, CLK_TCK};
pub use record::{ProcessRecord, Snapshot, SnapshotSource};
