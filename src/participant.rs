//! Health-check participant capability.
//!
//! A participant is an external subsystem that exposes a health check to the
//! watchdog. The set of participants is fixed at construction; the watchdog
//! holds read-only references and never mutates participant state.

use chrono::{DateTime, Utc};

/// Verdict returned by a participant's health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The subsystem is operating normally.
    Healthy,
    /// The subsystem reports a problem. The reason may be empty.
    Unhealthy { reason: String },
}

impl HealthStatus {
    /// Convenience constructor for an unhealthy verdict.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self::Unhealthy {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Unhealthy { reason } => write!(f, "UNHEALTHY: {reason}"),
        }
    }
}

/// Trait for subsystems monitored by the component loop.
///
/// The watchdog calls `check_health()` once per cycle, sequentially and in
/// registration order. Checks are expected to be cheap and local: they run
/// on the monitor task, and a slow check shows up as a cross-loop stall
/// warning from the platform monitor.
///
/// An `Err` return is treated as a fault in the participant itself (as
/// opposed to a *reported* health failure): it is logged with the
/// participant's name and excluded from the cycle's healthy and failed
/// tallies, without affecting the other participants. Panics are contained
/// the same way where unwinding is available.
pub trait HealthCheckParticipant: Send + Sync {
    /// Stable identifier used in log records.
    fn name(&self) -> &str;

    /// Check the subsystem's health.
    ///
    /// `last_checked` is the wall-clock completion time of the previous
    /// cycle, strictly increasing across cycles. Participants typically use
    /// it to answer "has anything happened since the watchdog last asked".
    fn check_health(&self, last_checked: DateTime<Utc>) -> anyhow::Result<HealthStatus>;
}
