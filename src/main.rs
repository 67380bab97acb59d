//! hjkl-arrows: remap Command+H/J/K/L to arrow keys system-wide
//!
//! A lightweight alternative to full remapping frameworks:
//! - Accessibility permission gate before anything is installed
//! - A single CGEventTap on key down/up, running on its own CFRunLoop thread
//! - Command+H/J/K/L become ←/↓/↑/→; Shift is kept for selection
//! - The tap is re-enabled whenever macOS disables it
//!
//! Exits 0 on SIGINT/SIGTERM, 2 without Accessibility permission, 3 when the
//! tap cannot be created.

mod access;
mod config;
mod lifecycle;
mod remap;
mod stats;
mod tap;

use std::process::ExitCode;

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::access::AccessibilityCheck;
use crate::config::Config;
use crate::lifecycle::{ensure_capability, Failure, ShutdownSignal};
use crate::remap::RemapTable;
use crate::tap::{TapError, TapManager};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the status lines
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hjkl-arrows starting");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(exit_code = failure.exit_code(), "{failure:#}");
            eprintln!("Error: {failure}");
            if let Some(guidance) = failure.guidance() {
                eprintln!("{guidance}");
            }
            ExitCode::from(&failure)
        }
    }
}

async fn run() -> Result<(), Failure> {
    println!("hjkl-arrows: Cmd+HJKL → Arrow Keys");
    println!("Press Ctrl+C to quit\n");

    let config = Config::load()?;
    info!(?config, "configuration loaded");

    ensure_capability(&AccessibilityCheck::new(config.prompt_for_access))?;
    println!("✓ Accessibility permission granted");

    // Register before the tap exists so an early Ctrl+C still tears it down
    let mut shutdown = ShutdownSignal::new()?;

    // start() waits on the tap thread's readiness report
    let location = config.tap_location;
    let tap = tokio::task::spawn_blocking(move || -> Result<TapManager, TapError> {
        let mut tap = TapManager::new(location);
        tap.start()?;
        Ok(tap)
    })
    .await
    .context("tap startup task failed")??;
    debug_assert!(tap.is_running());
    debug!(entries = ?RemapTable::hjkl().entries(), "remap table");
    info!(location = %tap.location(), state = ?tap.state(), "event tap running");
    println!("✓ Event tap created");

    println!("✓ Active: Cmd+H/J/K/L → ←/↓/↑/→");
    println!("  (Cmd+Shift+HJKL works for selection)\n");

    let reason = shutdown.wait().await;
    info!(%reason, "shutdown signal received");

    let stats = tokio::task::spawn_blocking(move || {
        let mut tap = tap;
        tap.stop()
    })
    .await
    .context("tap shutdown task failed")?;
    match serde_json::to_string(&stats) {
        Ok(json) => info!(stats = %json, "hjkl-arrows stopped"),
        Err(e) => info!(%stats, ?e, "hjkl-arrows stopped"),
    }

    Ok(())
}
