//! Platform monitor loop.
//!
//! Watches for symptoms of the *scheduler itself* stalling: if this loop's
//! own clock shows materially more than one period between iterations, the
//! runtime was paused, starved, or overloaded. It also cross-checks the
//! component monitor's clock: each loop can stall without crashing, and
//! only the other loop is positioned to notice.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::clock::StallClock;
use crate::config::{stall_threshold, PLATFORM_CHECK_PERIOD};
use crate::diagnostics::RuntimeDiagnostics;

/// Evidence that the platform monitor itself ran late.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlatformStallReport {
    pub elapsed: Duration,
    /// Runtime pause time accumulated since the last clock restart.
    pub pause_delta: Duration,
    pub memory_bytes: u64,
    pub collection_counts: Vec<u64>,
}

/// Result of one stall evaluation.
#[derive(Debug, Default)]
pub(crate) struct CheckOutcome {
    pub platform_stall: Option<PlatformStallReport>,
    /// Elapsed time on the component monitor's clock, when over threshold.
    pub component_stall: Option<Duration>,
}

pub(crate) struct PlatformMonitor {
    component_period: Duration,
    platform_clock: Arc<StallClock>,
    component_clock: Arc<StallClock>,
    diagnostics: Arc<dyn RuntimeDiagnostics>,
    pause_baseline: Duration,
}

impl PlatformMonitor {
    pub(crate) fn new(
        component_period: Duration,
        platform_clock: Arc<StallClock>,
        component_clock: Arc<StallClock>,
        diagnostics: Arc<dyn RuntimeDiagnostics>,
    ) -> Self {
        let pause_baseline = diagnostics
            .snapshot()
            .map(|s| s.cumulative_pause)
            .unwrap_or_default();
        Self {
            component_period,
            platform_clock,
            component_clock,
            diagnostics,
            pause_baseline,
        }
    }

    /// Run until cancelled. Never returns early on internal failures.
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        debug!(period = ?PLATFORM_CHECK_PERIOD, "platform monitor started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Skipped entirely under a debugger: a breakpoint pause stalls
            // both clocks and would trip both warnings falsely.
            if !self.diagnostics.debugger_attached() {
                match self.check() {
                    Ok(outcome) => report(&outcome),
                    Err(error) => error!(error = %error, "platform stall check failed"),
                }
            }

            // Restart happens every iteration, debugger or not, so detection
            // resumes cleanly once a debugger detaches.
            self.platform_clock.restart();
            self.refresh_pause_baseline();

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(PLATFORM_CHECK_PERIOD) => {}
            }
        }

        debug!("platform monitor stopped");
    }

    /// Evaluate both stall conditions against the current clocks.
    fn check(&self) -> anyhow::Result<CheckOutcome> {
        let mut outcome = CheckOutcome::default();

        let elapsed = self.platform_clock.elapsed();
        if elapsed > stall_threshold(PLATFORM_CHECK_PERIOD) {
            let snapshot = self.diagnostics.snapshot()?;
            outcome.platform_stall = Some(PlatformStallReport {
                elapsed,
                pause_delta: snapshot.cumulative_pause.saturating_sub(self.pause_baseline),
                memory_bytes: snapshot.memory_bytes,
                collection_counts: snapshot.collection_counts,
            });
        }

        let component_elapsed = self.component_clock.elapsed();
        if component_elapsed > stall_threshold(self.component_period) {
            outcome.component_stall = Some(component_elapsed);
        }

        Ok(outcome)
    }

    fn refresh_pause_baseline(&mut self) {
        if let Ok(snapshot) = self.diagnostics.snapshot() {
            self.pause_baseline = snapshot.cumulative_pause;
        }
    }
}

fn report(outcome: &CheckOutcome) {
    if let Some(stall) = &outcome.platform_stall {
        warn!(
            elapsed = ?stall.elapsed,
            pause_delta = ?stall.pause_delta,
            memory_bytes = stall.memory_bytes,
            collection_counts = ?stall.collection_counts,
            "platform monitor ran late; the scheduler may be stalling"
        );
    }
    if let Some(elapsed) = outcome.component_stall {
        warn!(
            elapsed = ?elapsed,
            "component monitor has not reported in; possible lock contention, \
             deadlock, CPU starvation, or another execution anomaly"
        );
    }
}
