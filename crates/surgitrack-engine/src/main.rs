//! SurgiTrack binary.
//!
//! Wires the time engine to its snapshot storage, the observer API and
//! the periodic tick loop, then runs until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `surgitrack-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the snapshot slot
//! 4. Open the time engine (load + catch-up pass)
//! 5. Build the advisor from the environment
//! 6. Start the observer API server
//! 7. Run the tick loop until Ctrl-C
//! 8. Log the result

mod error;
mod observer_callback;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use surgitrack_advisor::{Advisor, AdvisorConfig};
use surgitrack_core::clock::SystemClock;
use surgitrack_core::config::SurgiTrackConfig;
use surgitrack_core::engine::TimeEngine;
use surgitrack_core::runner::{self, EngineHandle};
use surgitrack_db::{MemorySlot, SledSlot, SnapshotSlot};
use surgitrack_observer::AppState;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineBinError;
use crate::observer_callback::ObserverCallback;

const CONFIG_PATH: &str = "surgitrack-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails. Failures after startup
/// are logged and never stop the tick loop.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), EngineBinError> {
    // 1. Load configuration. Logging is not up yet, so remember where
    //    the config came from and report it after step 2.
    let config_path = Path::new(CONFIG_PATH);
    let from_file = config_path.exists();
    let config = if from_file {
        SurgiTrackConfig::from_file(config_path)?
    } else {
        SurgiTrackConfig::parse("")?
    };

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("surgitrack-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        room_count = config.fleet.room_count,
        hyper_septic_rooms = ?config.fleet.hyper_septic_rooms,
        tick_interval_ms = config.engine.tick_interval_ms,
        utc_offset_minutes = config.display.utc_offset_minutes,
        "Configuration loaded"
    );

    // 3. Open the snapshot slot.
    let slot: Box<dyn SnapshotSlot> = if config.storage.ephemeral {
        warn!("Ephemeral storage: room state is lost on exit");
        Box::new(MemorySlot::new(config.storage.slot_key.clone()))
    } else {
        let slot = SledSlot::open(&config.storage.data_dir, config.storage.slot_key.clone())?;
        info!(
            data_dir = %config.storage.data_dir.display(),
            slot_key = config.storage.slot_key,
            "Snapshot slot opened"
        );
        Box::new(slot)
    };

    // 4. Open the time engine.
    let (engine, startup) = TimeEngine::open(&config, slot, Arc::new(SystemClock))?;
    info!(
        restored = startup.load.restored,
        created = startup.load.created.len(),
        dropped = startup.load.dropped.len(),
        repaired = startup.load.repaired.len(),
        rejected = ?startup.load.rejected,
        unreadable_rooms = startup.load.unreadable_rooms,
        legacy_layout = startup.load.legacy_layout,
        discarded_corrupt = startup.load.discarded_corrupt,
        "Room store loaded"
    );
    info!(
        transitions = startup.catch_up.transitions.len(),
        failures = startup.catch_up.failures.len(),
        "Catch-up pass complete"
    );
    let default_cleaning_minutes = engine.catalog().default_cleaning_minutes();
    let handle = EngineHandle::new(engine);

    // 5. Build the advisor.
    let advisor_config = match AdvisorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Invalid advisor settings, advisor disabled");
            None
        }
    };
    if advisor_config.is_none() {
        info!("Advisor not configured");
    }
    let advisor = Advisor::new(advisor_config, None)?;

    // 6. Start the observer API server.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app_state = Arc::new(AppState::new(handle.clone(), &config, advisor));
    let listener = surgitrack_observer::bind(&config.observer).await?;
    let server_state = Arc::clone(&app_state);
    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        let signal = async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        };
        if let Err(e) = surgitrack_observer::serve(listener, server_state, signal).await {
            error!(error = %e, "Observer server failed");
        }
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    // 7. Run the tick loop.
    let mut callback = ObserverCallback::new(app_state, default_cleaning_minutes);
    let report = runner::run_ticks(
        &handle,
        Duration::from_millis(config.engine.tick_interval_ms),
        &mut callback,
        shutdown_rx,
    )
    .await;

    // 8. Log the result.
    runner::log_run_end(&report);
    if let Err(e) = server.await {
        warn!(error = %e, "Observer task did not finish cleanly");
    }
    if handle.lock().await.has_unsaved_changes() {
        warn!("Exiting with unsaved room changes");
    }
    info!("surgitrack-engine shutdown complete");

    Ok(())
}
