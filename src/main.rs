//! procsentry demo binary
//!
//! Runs the watchdog against its own process with a couple of sample
//! participants: a heap-headroom check built on the process diagnostics
//! provider, and a simulated flaky subsystem for exercising the aggregated
//! failure reporting.
//!
//! # Usage
//!
//! ```bash
//! # Default: 5 s component period, 20% simulated failure rate
//! cargo run --release
//!
//! # Tighter cadence, noisier flaky subsystem
//! cargo run --release -- --component-period-ms 1000 --flaky-rate 0.5
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::Rng;
use tracing::info;

use procsentry::{
    HealthCheckParticipant, HealthStatus, ProcessDiagnostics, RuntimeDiagnostics, Watchdog,
    WatchdogConfig,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "procsentry")]
#[command(about = "In-process watchdog demo - monitors this process until Ctrl+C")]
#[command(version)]
struct CliArgs {
    /// Component health-check period in milliseconds
    #[arg(long, default_value = "5000")]
    component_period_ms: u64,

    /// Probability that the simulated flaky subsystem reports unhealthy on
    /// a given cycle (clamped to [0, 1])
    #[arg(long, default_value = "0.2")]
    flaky_rate: f64,

    /// Resident-memory limit for the heap headroom check, in megabytes
    #[arg(long, default_value = "1024")]
    memory_limit_mb: u64,
}

// ============================================================================
// Sample Participants
// ============================================================================

/// Reports unhealthy once resident memory exceeds a fixed limit.
struct HeapHeadroomCheck {
    diagnostics: ProcessDiagnostics,
    limit_bytes: u64,
}

impl HealthCheckParticipant for HeapHeadroomCheck {
    fn name(&self) -> &str {
        "heap-headroom"
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> Result<HealthStatus> {
        let snapshot = self.diagnostics.snapshot()?;
        if snapshot.memory_bytes > self.limit_bytes {
            return Ok(HealthStatus::unhealthy(format!(
                "resident memory {} MB exceeds limit {} MB",
                snapshot.memory_bytes / (1024 * 1024),
                self.limit_bytes / (1024 * 1024)
            )));
        }
        Ok(HealthStatus::Healthy)
    }
}

/// Simulated subsystem that fails intermittently.
struct FlakySubsystemCheck {
    failure_rate: f64,
}

impl HealthCheckParticipant for FlakySubsystemCheck {
    fn name(&self) -> &str {
        "flaky-subsystem"
    }

    fn check_health(&self, _last_checked: DateTime<Utc>) -> Result<HealthStatus> {
        if rand::thread_rng().gen_bool(self.failure_rate) {
            return Ok(HealthStatus::unhealthy("simulated intermittent fault"));
        }
        Ok(HealthStatus::Healthy)
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = WatchdogConfig::new(Duration::from_millis(args.component_period_ms));
    let participants: Vec<Arc<dyn HealthCheckParticipant>> = vec![
        Arc::new(HeapHeadroomCheck {
            diagnostics: ProcessDiagnostics::new(),
            limit_bytes: args.memory_limit_mb * 1024 * 1024,
        }),
        Arc::new(FlakySubsystemCheck {
            failure_rate: args.flaky_rate.clamp(0.0, 1.0),
        }),
    ];

    let mut watchdog = Watchdog::new(config, participants, Arc::new(ProcessDiagnostics::new()))?;
    watchdog.start()?;
    info!("watchdog running; press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, initiating shutdown...");
    watchdog.stop().await;

    let snapshot = watchdog.metrics().snapshot();
    info!(
        cycles = snapshot.health_check_cycles,
        failed_cycles = snapshot.failed_health_checks,
        "final watchdog counters"
    );

    Ok(())
}
