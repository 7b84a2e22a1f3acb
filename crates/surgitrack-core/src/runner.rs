//! Periodic tick loop around a shared [`TimeEngine`].
//!
//! [`run_ticks`] drives the engine at the configured interval until the
//! shutdown signal flips. Ticks never overlap: each one takes the engine
//! lock, evaluates the fleet, persists, and releases the lock before the
//! callback runs. A late tick is skipped rather than bunched, because the
//! next evaluation catches up on everything it missed anyway.

use std::sync::Arc;
use std::time::Duration;

use surgitrack_types::Room;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::{TickSummary, TimeEngine};

/// Shared, serialized access to the engine.
///
/// Every mutation (tick or operator request) takes the same lock, so they
/// run one at a time and each sees the previous one's result.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<TimeEngine>>,
}

impl EngineHandle {
    /// Wrap an engine for sharing.
    pub fn new(engine: TimeEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Wait for exclusive access.
    pub async fn lock(&self) -> MutexGuard<'_, TimeEngine> {
        self.inner.lock().await
    }
}

/// Callback invoked after each tick.
///
/// Runs outside the engine lock with the tick's summary and the rooms as
/// they were right after it.
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, rooms: &[Arc<Room>]);
}

/// A tick callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _rooms: &[Arc<Room>]) {}
}

/// Outcome of a tick loop run.
#[derive(Debug)]
pub struct RunReport {
    /// Ticks executed by this loop.
    pub total_ticks: u64,
    /// Transitions applied across those ticks.
    pub total_transitions: u64,
    /// The last tick summary, if any tick ran.
    pub last_summary: Option<TickSummary>,
}

/// Tick the engine every `interval` until `shutdown` becomes `true` or
/// its sender is dropped.
pub async fn run_ticks(
    handle: &EngineHandle,
    interval: Duration,
    callback: &mut dyn TickCallback,
    mut shutdown: watch::Receiver<bool>,
) -> RunReport {
    let period = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(
        Instant::now().checked_add(period).unwrap_or_else(Instant::now),
        period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut report = RunReport {
        total_ticks: 0,
        total_transitions: 0,
        last_summary: None,
    };

    info!(interval_ms = period.as_millis(), "Tick loop starting");

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("Shutdown sender dropped");
                    break;
                }
            }
            _ = ticker.tick() => {
                let (summary, rooms) = {
                    let mut engine = handle.lock().await;
                    let summary = engine.tick();
                    (summary, engine.rooms())
                };
                report.total_ticks = report.total_ticks.saturating_add(1);
                report.total_transitions = report
                    .total_transitions
                    .saturating_add(u64::try_from(summary.transitions.len()).unwrap_or(u64::MAX));
                callback.on_tick(&summary, &rooms);
                report.last_summary = Some(summary);
            }
        }
    }

    report
}

/// Log the end of a tick loop run.
pub fn log_run_end(report: &RunReport) {
    info!(
        total_ticks = report.total_ticks,
        total_transitions = report.total_transitions,
        last_tick = report.last_summary.as_ref().map(|s| s.tick),
        "Tick loop stopped"
    );
}
