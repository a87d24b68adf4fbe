//! Detection rule behavior across consecutive snapshots.
//!
//! Drives the detector with fabricated snapshot sequences and checks the
//! three rules (CPU breach, memory breach, rapid growth), the first-sight
//! exemptions, history overwrite semantics, and pid-reuse invalidation.

use chrono::{DateTime, Duration, Utc};
use procguard::detector::{Detector, Finding, Reason, Thresholds};
use procguard::process::ProcessRecord;

const START: u64 = 1000;

fn thresholds() -> Thresholds {
    Thresholds {
        cpu_percent: 70.0,
        memory_mb: 400,
        growth_mb: 100,
    }
}

fn record_at(
    pid: u32,
    cpu_secs: f64,
    mem_mb: u64,
    timestamp: DateTime<Utc>,
) -> ProcessRecord {
    ProcessRecord {
        pid,
        start_time_ticks: START,
        name: format!("proc-{pid}"),
        cpu_time_seconds: cpu_secs,
        memory_kb: mem_mb * 1024,
        measured: true,
        timestamp,
    }
}

fn reasons_of(finding: &Finding) -> Vec<&Reason> {
    finding.reasons.iter().collect()
}

#[test]
fn quiet_process_produces_no_finding() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    // 0.5 CPU seconds over 5s = 10%, memory steady at 50 MB
    assert!(detector.detect(&vec![record_at(100, 1.0, 50, t0)]).is_empty());
    let findings = detector.detect(&vec![record_at(100, 1.5, 50, t1)]);
    assert!(findings.is_empty());
}

#[test]
fn memory_breach_fires_regardless_of_cpu() {
    let mut detector = Detector::new(thresholds());
    let findings = detector.detect(&vec![record_at(7, 0.0, 401, Utc::now())]);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].pid, 7);
    assert_eq!(findings[0].memory_mb, 401);
    assert_eq!(
        reasons_of(&findings[0]),
        vec![&Reason::HighMemory { memory_mb: 401 }]
    );
}

#[test]
fn memory_threshold_is_strict() {
    let mut detector = Detector::new(thresholds());
    // Exactly 400 MB does not fire.
    assert!(detector.detect(&vec![record_at(7, 0.0, 400, Utc::now())]).is_empty());
}

#[test]
fn cpu_breach_on_second_sample() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    // First sight: no prior, no CPU rate, no finding even though the
    // process has burned plenty of cumulative CPU time.
    assert!(detector.detect(&vec![record_at(200, 500.0, 100, t0)]).is_empty());

    // 4.25 extra CPU seconds over 5s = 85%
    let findings = detector.detect(&vec![record_at(200, 504.25, 100, t1)]);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].reasons.len(), 1);
    match &findings[0].reasons[0] {
        Reason::HighCpu { percent } => assert!((percent - 85.0).abs() < 0.5),
        other => panic!("expected HighCpu, got {other:?}"),
    }
    // Memory rule did not fire at 100 MB.
    assert_eq!(findings[0].memory_mb, 100);
}

#[test]
fn growth_breach_scenario() {
    // Thresholds cpu 70%, mem 400 MB. Sample 1: 50 MB. Sample 2: 200 MB.
    // Growth of 150 MB > 100 fires, nothing else does.
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    assert!(detector.detect(&vec![record_at(100, 0.5, 50, t0)]).is_empty());

    let findings = detector.detect(&vec![record_at(100, 0.5, 200, t1)]);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].pid, 100);
    assert_eq!(
        reasons_of(&findings[0]),
        vec![&Reason::RapidGrowth { grown_mb: 150.0 }]
    );
}

#[test]
fn growth_threshold_is_strict() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    detector.detect(&vec![record_at(1, 0.0, 50, t0)]);
    // Exactly +100 MB does not fire.
    assert!(detector.detect(&vec![record_at(1, 0.0, 150, t1)]).is_empty());

    let t2 = t1 + Duration::seconds(5);
    // +101 MB does.
    let findings = detector.detect(&vec![record_at(1, 0.0, 251, t2)]);
    assert_eq!(findings.len(), 1);
    assert_eq!(
        reasons_of(&findings[0]),
        vec![&Reason::RapidGrowth { grown_mb: 101.0 }]
    );
}

#[test]
fn first_observation_never_fires_growth() {
    let mut detector = Detector::new(thresholds());
    // Arbitrarily large memory on first sight fires only the static
    // memory rule, never growth.
    let findings = detector.detect(&vec![record_at(9, 0.0, 100_000, Utc::now())]);
    assert_eq!(findings.len(), 1);
    assert_eq!(
        reasons_of(&findings[0]),
        vec![&Reason::HighMemory { memory_mb: 100_000 }]
    );
}

#[test]
fn multiple_rules_all_reported() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    detector.detect(&vec![record_at(3, 0.0, 300, t0)]);
    // +200 MB growth to 500 MB while burning 100% CPU: all three rules.
    let findings = detector.detect(&vec![record_at(3, 5.0, 500, t1)]);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].reasons.len(), 3);
    assert!(matches!(findings[0].reasons[0], Reason::HighCpu { .. }));
    assert!(matches!(
        findings[0].reasons[1],
        Reason::HighMemory { memory_mb: 500 }
    ));
    assert!(matches!(findings[0].reasons[2], Reason::RapidGrowth { .. }));
}

#[test]
fn history_reflects_most_recent_sample() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();

    for i in 1..=5u64 {
        let t = t0 + Duration::seconds(5 * i as i64);
        detector.detect(&vec![record_at(42, i as f64, 10 * i, t)]);
    }

    let entry = detector.history().get(42).expect("entry for pid 42");
    assert_eq!(entry.memory_kb, 50 * 1024);
    assert!((entry.cpu_time_seconds - 5.0).abs() < 1e-9);
}

#[test]
fn repeated_identical_snapshot_stops_firing_growth() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    detector.detect(&vec![record_at(8, 0.0, 100, t0)]);
    let snap = vec![record_at(8, 0.0, 450, t1)];

    let first = detector.detect(&snap);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].reasons.len(), 2); // high memory + growth

    // Same snapshot again: prior == current, delta = 0, so only the
    // static memory rule still fires.
    let second = detector.detect(&snap);
    assert_eq!(second.len(), 1);
    assert_eq!(
        reasons_of(&second[0]),
        vec![&Reason::HighMemory { memory_mb: 450 }]
    );
}

#[test]
fn empty_snapshot_changes_nothing() {
    let mut detector = Detector::new(thresholds());
    detector.detect(&vec![record_at(1, 0.0, 50, Utc::now())]);

    let findings = detector.detect(&Vec::new());
    assert!(findings.is_empty());
    assert_eq!(detector.history().len(), 1);
}

#[test]
fn recycled_pid_is_a_fresh_observation() {
    let mut detector = Detector::new(thresholds());
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(5);

    detector.detect(&vec![record_at(77, 0.0, 10, t0)]);

    // Same pid, different start time: a new process. The 300 MB jump
    // must not be read as growth of the old one.
    let mut reborn = record_at(77, 100.0, 310, t1);
    reborn.start_time_ticks = START + 12345;
    let findings = detector.detect(&vec![reborn]);
    assert!(findings.is_empty());

    // History now tracks the new incarnation.
    let entry = detector.history().get(77).expect("entry");
    assert_eq!(entry.start_time_ticks, START + 12345);
}

#[test]
fn findings_follow_snapshot_order() {
    let mut detector = Detector::new(thresholds());
    let t = Utc::now();
    let snap = vec![
        record_at(30, 0.0, 500, t),
        record_at(10, 0.0, 50, t),
        record_at(20, 0.0, 600, t),
    ];

    let findings = detector.detect(&snap);
    let pids: Vec<u32> = findings.iter().map(|f| f.pid).collect();
    assert_eq!(pids, vec![30, 20]);
}
