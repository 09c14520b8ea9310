//! Fire-and-forget watchdog counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters produced by the component monitor loop.
///
/// Shared as an `Arc` between the loop and whatever metrics backend the
/// hosting process scrapes them into. Updates use relaxed ordering; the
/// counters are advisory.
#[derive(Debug, Default)]
pub struct WatchdogMetrics {
    health_check_cycles: AtomicU64,
    failed_health_checks: AtomicU64,
}

impl WatchdogMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One component health-check cycle started.
    pub(crate) fn record_cycle(&self) {
        self.health_check_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// One cycle finished with at least one reported failure. Incremented
    /// once per cycle, not once per failing participant.
    pub(crate) fn record_failed_cycle(&self) {
        self.failed_health_checks.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            health_check_cycles: self.health_check_cycles.load(Ordering::Relaxed),
            failed_health_checks: self.failed_health_checks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the watchdog counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total component health-check cycles run.
    pub health_check_cycles: u64,
    /// Total cycles in which at least one participant reported unhealthy.
    pub failed_health_checks: u64,
}
