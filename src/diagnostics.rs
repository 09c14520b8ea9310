//! Runtime diagnostics provider.
//!
//! The platform monitor needs a handful of process-global facts: accumulated
//! runtime pause time, current memory usage, collection counters, and whether
//! an interactive debugger is attached. They are behind a trait so the
//! hosting process can supply its runtime's closest equivalents and tests can
//! fake them.

use std::time::Duration;

#[cfg(target_os = "linux")]
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of runtime diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// Total pause time accumulated by the hosting runtime since process
    /// start (e.g. garbage-collector pauses). Zero when the runtime has no
    /// pause concept.
    pub cumulative_pause: Duration,
    /// Current resident memory usage in bytes.
    pub memory_bytes: u64,
    /// Per-generation (or per-cycle-class) collection counts. Empty when the
    /// runtime has no collector.
    pub collection_counts: Vec<u64>,
}

/// Read-only process-global diagnostics consumed by the platform monitor.
pub trait RuntimeDiagnostics: Send + Sync {
    /// Capture the current diagnostics snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying platform facts cannot be read;
    /// the monitor logs the failure and carries on.
    fn snapshot(&self) -> anyhow::Result<RuntimeSnapshot>;

    /// Whether an interactive debugger is attached to the process. Stall
    /// checks are suppressed while one is, so breakpoint pauses do not raise
    /// false alarms.
    fn debugger_attached(&self) -> bool;
}

/// Default provider for a plain native process.
///
/// Memory usage comes from `/proc/self/statm`, debugger detection from the
/// `TracerPid` field of `/proc/self/status`. A plain Rust process has no
/// managed-runtime pauses, so `cumulative_pause` is always zero and
/// `collection_counts` is empty; processes embedding a collected runtime
/// should supply their own provider instead. On non-Linux targets memory
/// reports zero and debugger detection reports false.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessDiagnostics;

impl ProcessDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RuntimeDiagnostics for ProcessDiagnostics {
    fn snapshot(&self) -> anyhow::Result<RuntimeSnapshot> {
        Ok(RuntimeSnapshot {
            cumulative_pause: Duration::ZERO,
            memory_bytes: resident_memory_bytes()?,
            collection_counts: Vec::new(),
        })
    }

    fn debugger_attached(&self) -> bool {
        tracer_pid().is_some_and(|pid| pid != 0)
    }
}

/// Resident set size in bytes, from `/proc/self/statm` (field 2, in pages).
#[cfg(target_os = "linux")]
#[allow(clippy::cast_sign_loss)]
fn resident_memory_bytes() -> anyhow::Result<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm")
        .context("failed to read /proc/self/statm")?;
    let resident_pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("malformed /proc/self/statm: {statm:?}"))?
        .parse()
        .context("failed to parse resident page count")?;

    // SAFETY: sysconf(_SC_PAGESIZE) reads a static configuration value.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        bail!("sysconf(_SC_PAGESIZE) failed");
    }

    Ok(resident_pages * page_size as u64)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> anyhow::Result<u64> {
    Ok(0)
}

/// PID of the tracing process from `/proc/self/status`, if readable.
#[cfg(target_os = "linux")]
fn tracer_pid() -> Option<u32> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("TracerPid:"))?;
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(not(target_os = "linux"))]
fn tracer_pid() -> Option<u32> {
    None
}
