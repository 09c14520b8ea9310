//! Watchdog core: lifecycle controller and the two monitor loops.
//!
//! [`Watchdog`] owns two background tokio tasks sharing one cancellation
//! token and two stall clocks:
//!
//! - the **platform monitor** watches for scheduler/runtime stalls and
//!   cross-checks the component loop's liveness;
//! - the **component monitor** runs the registered health-check
//!   participants and aggregates their verdicts.
//!
//! Each loop restarts its own clock every iteration and reads the *other*
//! loop's clock to notice the other one is stuck, since a loop cannot detect
//! its own stall while stalled.

pub mod clock;

mod component;
mod platform;

pub use self::component::HealthReport;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::clock::StallClock;
use self::component::ComponentMonitor;
use self::platform::PlatformMonitor;
use crate::config::WatchdogConfig;
use crate::diagnostics::RuntimeDiagnostics;
use crate::error::WatchdogError;
use crate::metrics::WatchdogMetrics;
use crate::participant::HealthCheckParticipant;

/// Most recent component-cycle outcome, kept behind a shared handle so an
/// embedding server (status endpoint, dashboard) can expose it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchdogHealth {
    /// Completed health-check cycles since `start()`.
    pub check_cycles: u64,
    /// Report from the most recent cycle, if any has completed.
    pub last_report: Option<HealthReport>,
}

/// In-process watchdog for a long-running service.
///
/// Construction takes an immutable snapshot of the participants; there is no
/// runtime registration. `start()` spawns both monitor loops as background
/// tasks and may be called at most once per instance. A second call is a
/// programming error, reported as [`WatchdogError::AlreadyStarted`].
/// `stop()` cancels the shared token, then waits for both loops to exit;
/// every shutdown step is independently fault-isolated, so `stop()` never
/// fails and is safe to call before `start()` or repeatedly.
///
/// Nothing that happens inside the loops (participant faults, stall
/// warnings, internal errors) ever propagates to the caller; operators
/// observe health exclusively through logs, counters, and the
/// [`health_handle()`](Watchdog::health_handle) snapshot.
pub struct Watchdog {
    config: WatchdogConfig,
    participants: Arc<[Arc<dyn HealthCheckParticipant>]>,
    diagnostics: Arc<dyn RuntimeDiagnostics>,
    metrics: Arc<WatchdogMetrics>,
    health: Arc<RwLock<WatchdogHealth>>,
    platform_clock: Arc<StallClock>,
    component_clock: Arc<StallClock>,
    cancel_token: CancellationToken,
    platform_task: Option<JoinHandle<()>>,
    component_task: Option<JoinHandle<()>>,
    started: bool,
}

impl Watchdog {
    /// Create a watchdog over the given participants.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(
        config: WatchdogConfig,
        participants: Vec<Arc<dyn HealthCheckParticipant>>,
        diagnostics: Arc<dyn RuntimeDiagnostics>,
    ) -> Result<Self, WatchdogError> {
        config.validate()?;
        Ok(Self {
            config,
            participants: participants.into(),
            diagnostics,
            metrics: Arc::new(WatchdogMetrics::new()),
            health: Arc::new(RwLock::new(WatchdogHealth::default())),
            platform_clock: Arc::new(StallClock::new()),
            component_clock: Arc::new(StallClock::new()),
            cancel_token: CancellationToken::new(),
            platform_task: None,
            component_task: None,
            started: false,
        })
    }

    /// Launch both monitor loops as background tasks.
    ///
    /// Does not block; must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::AlreadyStarted`] on a second call; the
    /// watchdog never spawns a third loop.
    pub fn start(&mut self) -> Result<(), WatchdogError> {
        if self.started {
            return Err(WatchdogError::AlreadyStarted);
        }
        self.started = true;

        self.platform_clock.restart();
        self.component_clock.restart();

        let platform = PlatformMonitor::new(
            self.config.component_period,
            Arc::clone(&self.platform_clock),
            Arc::clone(&self.component_clock),
            Arc::clone(&self.diagnostics),
        );
        let component = ComponentMonitor::new(
            Arc::clone(&self.participants),
            self.config.component_period,
            Arc::clone(&self.component_clock),
            Arc::clone(&self.diagnostics),
            Arc::clone(&self.metrics),
            Arc::clone(&self.health),
            Utc::now(),
        );

        self.platform_task = Some(tokio::spawn(platform.run(self.cancel_token.clone())));
        self.component_task = Some(tokio::spawn(component.run(self.cancel_token.clone())));

        info!(
            participants = self.participants.len(),
            component_period = ?self.config.component_period,
            "watchdog started"
        );
        Ok(())
    }

    /// Signal cancellation and wait for both loops to exit.
    ///
    /// Safe to call without a prior `start()` (the joins are no-ops) and
    /// safe to call repeatedly. Join failures are swallowed so shutdown
    /// always completes from the caller's perspective. When this returns,
    /// both loops are guaranteed to have exited.
    pub async fn stop(&mut self) {
        self.cancel_token.cancel();

        if let Some(handle) = self.component_task.take() {
            if let Err(error) = handle.await {
                warn!(error = %error, "component monitor did not shut down cleanly");
            }
        }
        if let Some(handle) = self.platform_task.take() {
            if let Err(error) = handle.await {
                warn!(error = %error, "platform monitor did not shut down cleanly");
            }
        }

        debug!("watchdog stopped");
    }

    /// Shared counters produced by the component loop.
    #[must_use]
    pub fn metrics(&self) -> Arc<WatchdogMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Shared handle to the most recent cycle outcome.
    #[must_use]
    pub fn health_handle(&self) -> Arc<RwLock<WatchdogHealth>> {
        Arc::clone(&self.health)
    }
}
