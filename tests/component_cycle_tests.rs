//! Component Cycle Tests
//!
//! End-to-end checks of the component monitor's aggregation and isolation
//! behavior through the public API: per-participant fault isolation, the
//! once-per-cycle failure counter, and the monotonic `last_checked`
//! timestamp participants receive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use procsentry::{
    HealthCheckParticipant, HealthStatus, RuntimeDiagnostics, RuntimeSnapshot, Watchdog,
    WatchdogConfig,
};

// ============================================================================
// Fixtures
// ============================================================================

struct QuietDiagnostics;

impl RuntimeDiagnostics for QuietDiagnostics {
    fn snapshot(&self) -> anyhow::Result<RuntimeSnapshot> {
        Ok(RuntimeSnapshot::default())
    }

    fn debugger_attached(&self) -> bool {
        false
    }
}

struct CountingCheck {
    name: &'static str,
    calls: AtomicU64,
}

impl CountingCheck {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: AtomicU64::new(0),
        }
    }

    fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl HealthCheckParticipant for CountingCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(HealthStatus::Healthy)
    }
}

struct FaultingCheck;

impl HealthCheckParticipant for FaultingCheck {
    fn name(&self) -> &str {
        "faulting"
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus> {
        Err(anyhow!("backend unreachable"))
    }
}

struct PanickingCheck;

impl HealthCheckParticipant for PanickingCheck {
    fn name(&self) -> &str {
        "panicking"
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus> {
        panic!("check blew up");
    }
}

struct UnhealthyCheck {
    name: &'static str,
    reason: &'static str,
}

impl HealthCheckParticipant for UnhealthyCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus> {
        Ok(HealthStatus::unhealthy(self.reason))
    }
}

struct RecordingCheck {
    seen: Mutex<Vec<DateTime<Utc>>>,
}

impl RecordingCheck {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl HealthCheckParticipant for RecordingCheck {
    fn name(&self) -> &str {
        "recording"
    }

    fn check_health(&self, last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus> {
        self.seen.lock().unwrap().push(last_checked);
        Ok(HealthStatus::Healthy)
    }
}

fn make_watchdog(period_ms: u64, participants: Vec<Arc<dyn HealthCheckParticipant>>) -> Watchdog {
    Watchdog::new(
        WatchdogConfig::new(Duration::from_millis(period_ms)),
        participants,
        Arc::new(QuietDiagnostics),
    )
    .unwrap()
}

// ============================================================================
// Cycle Behavior Tests
// ============================================================================

#[tokio::test]
async fn faulting_participant_does_not_affect_its_neighbors() {
    // B faults on every cycle; A and C are healthy. B's fault is logged,
    // not counted as a reported failure, and A and C keep getting checked.
    let a = Arc::new(CountingCheck::new("a"));
    let c = Arc::new(CountingCheck::new("c"));
    let mut watchdog = make_watchdog(
        20,
        vec![
            Arc::clone(&a) as Arc<dyn HealthCheckParticipant>,
            Arc::new(FaultingCheck),
            Arc::clone(&c) as Arc<dyn HealthCheckParticipant>,
        ],
    );

    watchdog.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    watchdog.stop().await;

    assert!(a.calls() >= 2);
    assert_eq!(a.calls(), c.calls());

    let snapshot = watchdog.metrics().snapshot();
    assert_eq!(snapshot.failed_health_checks, 0);

    let health = watchdog.health_handle();
    let health = health.read().await;
    let report = health.last_report.as_ref().unwrap();
    assert_eq!(report.participants_checked, 2);
    assert_eq!(report.failed, 0);
    assert!(report.complaints.is_empty());
}

#[tokio::test]
async fn failure_counter_increments_once_per_cycle_not_per_participant() {
    let mut watchdog = make_watchdog(
        20,
        vec![
            Arc::new(UnhealthyCheck {
                name: "cache",
                reason: "eviction backlog",
            }),
            Arc::new(UnhealthyCheck {
                name: "storage",
                reason: "compaction stuck",
            }),
        ],
    );

    watchdog.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    watchdog.stop().await;

    let snapshot = watchdog.metrics().snapshot();
    // Every cycle had two failures but counts exactly once.
    assert_eq!(snapshot.failed_health_checks, snapshot.health_check_cycles);

    let health = watchdog.health_handle();
    let health = health.read().await;
    let report = health.last_report.as_ref().unwrap();
    assert_eq!(report.failed, 2);
    assert_eq!(
        report.complaints,
        vec![
            "cache: eviction backlog".to_string(),
            "storage: compaction stuck".to_string()
        ]
    );
}

#[tokio::test]
async fn panicking_participant_does_not_kill_the_loop() {
    let survivor = Arc::new(CountingCheck::new("survivor"));
    let mut watchdog = make_watchdog(
        20,
        vec![
            Arc::new(PanickingCheck),
            Arc::clone(&survivor) as Arc<dyn HealthCheckParticipant>,
        ],
    );

    watchdog.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    watchdog.stop().await;

    // The loop kept cycling despite a panic on every single cycle, and the
    // participant after the panicking one was still reached.
    let snapshot = watchdog.metrics().snapshot();
    assert!(snapshot.health_check_cycles >= 2);
    assert!(survivor.calls() >= 2);
}

#[tokio::test]
async fn last_checked_strictly_increases_across_cycles() {
    let recording = Arc::new(RecordingCheck::new());
    let mut watchdog = make_watchdog(
        20,
        vec![Arc::clone(&recording) as Arc<dyn HealthCheckParticipant>],
    );

    watchdog.start().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    watchdog.stop().await;

    let seen = recording.seen.lock().unwrap();
    assert!(seen.len() >= 3, "expected several cycles, saw {}", seen.len());
    for pair in seen.windows(2) {
        assert!(pair[1] > pair[0], "last_checked went backwards: {pair:?}");
    }
}
