//! procsentry: in-process watchdog for long-running services
//!
//! Long-running server processes can silently degrade without crashing:
//! scheduler pauses, lock contention, deadlocks, or a misbehaving subsystem.
//! procsentry runs two independently scheduled monitor loops inside the
//! process and turns silent failure into structured warning signals.
//!
//! ## Architecture
//!
//! - **Platform monitor**: fixed 1 s cadence; detects its own iterations
//!   running late (a scheduler/runtime stall symptom) and cross-checks the
//!   component loop's liveness
//! - **Component monitor**: configurable cadence; invokes the registered
//!   [`HealthCheckParticipant`]s sequentially and aggregates failures into
//!   one report per cycle
//! - **Lifecycle controller**: [`Watchdog`] enforces single-start, owns both
//!   tasks, and drives coordinated shutdown over a shared
//!   `CancellationToken`
//!
//! Detection is advisory by design: the watchdog never fixes or restarts
//! anything, and nothing from inside the loops propagates to the caller.
//! Operators observe health through `tracing` records, the
//! [`WatchdogMetrics`] counters, and the shared [`WatchdogHealth`] snapshot.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod participant;
pub mod watchdog;

// Re-export configuration
pub use config::{WatchdogConfig, PLATFORM_CHECK_PERIOD, STALL_MULTIPLIER};

// Re-export the participant capability
pub use participant::{HealthCheckParticipant, HealthStatus};

// Re-export the diagnostics provider contract
pub use diagnostics::{ProcessDiagnostics, RuntimeDiagnostics, RuntimeSnapshot};

// Re-export observability types
pub use metrics::{MetricsSnapshot, WatchdogMetrics};

// Re-export the watchdog core
pub use error::WatchdogError;
pub use watchdog::clock::StallClock;
pub use watchdog::{HealthReport, Watchdog, WatchdogHealth};
