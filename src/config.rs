//! Watchdog configuration and cadence constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WatchdogError;

/// Platform monitor cadence (1 second).
///
/// Fixed rather than configurable: the platform check is cheap, and a
/// constant cadence keeps the stall threshold meaningful across deployments.
pub const PLATFORM_CHECK_PERIOD: Duration = Duration::from_secs(1);

/// A loop is considered stalled once its clock exceeds this multiple of its
/// period.
pub const STALL_MULTIPLIER: u32 = 2;

/// Watchdog configuration. Immutable after construction.
///
/// Only the component health-check period is configurable; the platform
/// cadence is [`PLATFORM_CHECK_PERIOD`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Interval between component health-check cycles.
    pub component_period: Duration,
}

impl WatchdogConfig {
    pub fn new(component_period: Duration) -> Self {
        Self { component_period }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::InvalidConfig`] if the component period is
    /// zero. A zero period would turn the component loop into a busy wait
    /// and make every cross-loop check fire.
    pub fn validate(&self) -> Result<(), WatchdogError> {
        if self.component_period.is_zero() {
            return Err(WatchdogError::InvalidConfig(
                "component_period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Elapsed time above which a loop with the given period counts as stalled.
pub(crate) fn stall_threshold(period: Duration) -> Duration {
    period * STALL_MULTIPLIER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_component_period_is_rejected() {
        let config = WatchdogConfig::new(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn nonzero_component_period_is_accepted() {
        let config = WatchdogConfig::new(Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stall_threshold_is_twice_the_period() {
        assert_eq!(
            stall_threshold(Duration::from_secs(1)),
            Duration::from_secs(2)
        );
        assert_eq!(
            stall_threshold(Duration::from_millis(250)),
            Duration::from_millis(500)
        );
    }
}
