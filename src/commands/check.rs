//! Check command implementation.
//!
//! Validates process-table access and configuration.

use crate::config::{validate_effective_config, Config};
use crate::process::{parse_stat_line, read_rss_kb, ProcfsSource, SnapshotSource, CLK_TCK};
use std::fs;

/// Validates process-table access and configuration.
pub fn command_check(config: &Config) -> anyhow::Result<()> {
    println!("🔍 procguard - System Check");
    println!("===========================");

    let mut all_ok = true;
    let root = config.effective_proc_root();

    println!("\n📁 Checking process table at {}...", root.display());
    if root.exists() {
        println!("   ✅ {} accessible", root.display());

        let entries = ProcfsSource::new(&root)
            .with_max_processes(Some(5))
            .snapshot();
        if entries.is_empty() {
            println!("   ❌ Cannot read any process entries");
            all_ok = false;
        } else {
            println!("   ✅ Can read process entries ({} sampled)", entries.len());
        }
    } else {
        println!("   ❌ {} not found", root.display());
        all_ok = false;
    }

    println!("\n⏱️  Checking clock tick rate...");
    println!("   ✅ {} ticks per second", *CLK_TCK);

    // Inspect our own process as a parse sanity check
    println!("\n🔬 Checking self-inspection...");
    let self_path = root.join(std::process::id().to_string());
    match fs::read_to_string(self_path.join("stat")) {
        Ok(line) => match parse_stat_line(&line) {
            Some(fields) => {
                println!("   ✅ Parsed own stat record ({})", fields.name);
                match read_rss_kb(&self_path) {
                    Some(kb) => println!("   ✅ Own resident memory: {} KiB", kb),
                    None => {
                        println!("   ❌ Cannot read own VmRSS");
                        all_ok = false;
                    }
                }
            }
            None => {
                println!("   ❌ Own stat record did not parse");
                all_ok = false;
            }
        },
        Err(e) => {
            println!("   ❌ Cannot read own stat record: {e}");
            all_ok = false;
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {e}");
            all_ok = false;
        }
    }

    if all_ok {
        println!("\n✅ All checks passed");
        Ok(())
    } else {
        anyhow::bail!("one or more checks failed");
    }
}
