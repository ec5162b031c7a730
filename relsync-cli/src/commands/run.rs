//! Run command - synchronize all configured components.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use relsync::config::ConfigFile;
use tracing::{info, warn};

use super::common::{build_synchronizer, print_report, require_sync_config};
use crate::error::CliError;

/// Run one cycle, or keep polling until Ctrl+C.
///
/// `run_once` in the config (or `RUN_ONCE=true`) has the same effect as
/// `--once`.
pub fn run(config: &ConfigFile, once: bool) -> Result<(), CliError> {
    let once = single_cycle(config, once);
    let sync_config = require_sync_config(config)?;
    if config.components.is_empty() {
        warn!("No components configured");
    }

    info!(
        install_dir = %sync_config.install_dir.display(),
        components = config.components.len(),
        "Starting relsync"
    );
    let synchronizer = build_synchronizer(config, sync_config)?;

    if once {
        let report = synchronizer.run_cycle(&config.components);
        print_report(&report);
        return Ok(());
    }

    // Set up signal handler for graceful shutdown
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping after the current step...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let interval = config.sync.poll_interval;
    while !shutdown.load(Ordering::SeqCst) {
        let report = synchronizer.run_cycle(&config.components);
        print_report(&report);

        info!(next_check_secs = interval.as_secs(), "Waiting for next cycle");
        wait_for(interval, &shutdown);
    }

    info!("Shutting down");
    Ok(())
}

fn single_cycle(config: &ConfigFile, once: bool) -> bool {
    once || config.sync.run_once
}

/// Sleep for `interval` in one-second steps, returning early on shutdown.
fn wait_for(interval: Duration, shutdown: &AtomicBool) {
    let started = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        let remaining = interval.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(Duration::from_secs(1)));
    }
}
