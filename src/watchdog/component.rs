//! Component monitor loop.
//!
//! Periodically walks the registered health-check participants, aggregates
//! failures into a single report per cycle, and updates the shared health
//! snapshot. Ordering inside a cycle is deliberate: the clock restarts
//! *before* the checks run so their duration never reads as a stall to the
//! cross-loop detector, and every participant is guarded individually so one
//! bad subsystem cannot silence visibility into the rest.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::clock::StallClock;
use super::WatchdogHealth;
use crate::diagnostics::RuntimeDiagnostics;
use crate::metrics::WatchdogMetrics;
use crate::participant::{HealthCheckParticipant, HealthStatus};

/// Aggregated result of one component health-check cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Participants that returned a verdict this cycle. A participant whose
    /// check itself faulted is excluded from this count.
    pub participants_checked: usize,
    /// Participants that reported unhealthy.
    pub failed: usize,
    /// One `name: reason` entry per unhealthy participant, in registration
    /// order.
    pub complaints: Vec<String>,
    /// Wall-clock completion time; supplied as `last_checked` to every
    /// participant on the next cycle.
    pub completed_at: DateTime<Utc>,
}

pub(crate) struct ComponentMonitor {
    participants: Arc<[Arc<dyn HealthCheckParticipant>]>,
    period: Duration,
    clock: Arc<StallClock>,
    diagnostics: Arc<dyn RuntimeDiagnostics>,
    metrics: Arc<WatchdogMetrics>,
    health: Arc<RwLock<WatchdogHealth>>,
    last_checked: DateTime<Utc>,
}

impl ComponentMonitor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        participants: Arc<[Arc<dyn HealthCheckParticipant>]>,
        period: Duration,
        clock: Arc<StallClock>,
        diagnostics: Arc<dyn RuntimeDiagnostics>,
        metrics: Arc<WatchdogMetrics>,
        health: Arc<RwLock<WatchdogHealth>>,
        last_checked: DateTime<Utc>,
    ) -> Self {
        Self {
            participants,
            period,
            clock,
            diagnostics,
            metrics,
            health,
            last_checked,
        }
    }

    /// Run until cancelled. A fault anywhere in a cycle is logged and the
    /// loop moves on to the next iteration.
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        debug!(
            participants = self.participants.len(),
            period = ?self.period,
            "component monitor started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let report = match catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
                Ok(report) => Some(report),
                Err(panic) => {
                    error!(
                        panic = panic_message(panic.as_ref()),
                        "health check cycle panicked"
                    );
                    None
                }
            };

            if let Some(report) = report {
                let mut health = self.health.write().await;
                health.check_cycles += 1;
                health.last_report = Some(report);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.period) => {}
            }
        }

        debug!("component monitor stopped");
    }

    /// One full pass over all participants.
    fn run_cycle(&mut self) -> HealthReport {
        self.metrics.record_cycle();

        // Restart before the checks: their duration must not be mistaken
        // for a stall by the platform monitor's cross-loop detector.
        self.clock.restart();

        let last_checked = self.last_checked;
        let mut checked = 0usize;
        let mut complaints = Vec::new();

        for participant in self.participants.iter() {
            let verdict =
                catch_unwind(AssertUnwindSafe(|| participant.check_health(last_checked)));
            match verdict {
                Ok(Ok(HealthStatus::Healthy)) => checked += 1,
                Ok(Ok(HealthStatus::Unhealthy { reason })) => {
                    checked += 1;
                    complaints.push(format!("{}: {reason}", participant.name()));
                }
                Ok(Err(error)) => {
                    warn!(
                        participant = participant.name(),
                        error = %error,
                        "health check participant failed to run"
                    );
                }
                Err(panic) => {
                    warn!(
                        participant = participant.name(),
                        panic = panic_message(panic.as_ref()),
                        "health check participant panicked"
                    );
                }
            }
        }

        let failed = complaints.len();
        if failed > 0 {
            self.metrics.record_failed_cycle();
            if !self.diagnostics.debugger_attached() {
                warn!(
                    failed,
                    checked,
                    total = self.participants.len(),
                    complaints = %complaints.join("; "),
                    "component health checks reported failures"
                );
            }
        }

        let completed_at = Utc::now();
        self.last_checked = completed_at;

        HealthReport {
            participants_checked: checked,
            failed,
            complaints,
            completed_at,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
