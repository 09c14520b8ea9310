//! Watchdog error types.

use thiserror::Error;

/// Errors surfaced by the watchdog's public lifecycle API.
///
/// Nothing that happens *inside* the monitor loops is ever reported here:
/// participant faults, stall warnings, and loop-internal errors are logged
/// and aggregated locally. The public surface only signals caller mistakes.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// `start()` was called on an instance that is already running.
    #[error("watchdog already started")]
    AlreadyStarted,

    /// The configuration failed validation.
    #[error("invalid watchdog configuration: {0}")]
    InvalidConfig(String),
}
