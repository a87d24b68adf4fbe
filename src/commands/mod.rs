//! CLI command implementations for procguard.
//!
//! - `check`: process-table accessibility validation
//! - `config`: configuration file generation
//! - `scan`: one-shot snapshot and detection pass

pub mod check;
pub mod config;
pub mod scan;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use scan::command_scan;
