//! Restartable monotonic stall clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Measures elapsed time since its last restart.
///
/// Each monitor loop owns one clock and restarts it every iteration; the
/// *other* loop reads it to detect that this one has stopped making progress.
/// The cross-loop read is deliberately lock-free with relaxed ordering: a
/// stale value can only shift a diagnostic warning by one period, so the
/// loops stay fully decoupled.
#[derive(Debug)]
pub struct StallClock {
    origin: Instant,
    last_restart_nanos: AtomicU64,
    #[cfg(test)]
    skew_nanos: AtomicU64,
}

impl StallClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_restart_nanos: AtomicU64::new(0),
            #[cfg(test)]
            skew_nanos: AtomicU64::new(0),
        }
    }

    /// Record "now" as the new baseline and return the elapsed time since
    /// the previous restart.
    pub fn restart(&self) -> Duration {
        let now = self.nanos_since_origin();
        let previous = self.last_restart_nanos.swap(now, Ordering::Relaxed);
        Duration::from_nanos(now.saturating_sub(previous))
    }

    /// Elapsed time since the last restart (or since construction).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let last = self.last_restart_nanos.load(Ordering::Relaxed);
        Duration::from_nanos(self.nanos_since_origin().saturating_sub(last))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn nanos_since_origin(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of process uptime.
        let nanos = self.origin.elapsed().as_nanos() as u64;
        #[cfg(test)]
        let nanos = nanos + self.skew_nanos.load(Ordering::Relaxed);
        nanos
    }

    /// Pretend `by` more time has passed, stretching the reported elapsed
    /// time without waiting.
    #[cfg(test)]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn advance(&self, by: Duration) {
        self.skew_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Default for StallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_starts_near_zero() {
        let clock = StallClock::new();
        assert!(clock.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn restart_returns_elapsed_and_resets() {
        let clock = StallClock::new();
        clock.advance(Duration::from_secs(5));

        let elapsed = clock.restart();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(clock.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn advance_stretches_elapsed() {
        let clock = StallClock::new();
        clock.restart();
        clock.advance(Duration::from_millis(2500));
        assert!(clock.elapsed() >= Duration::from_millis(2500));
    }
}
