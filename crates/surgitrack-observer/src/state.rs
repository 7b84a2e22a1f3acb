//! Shared application state for the observer API.
//!
//! Reads and writes both go through the [`EngineHandle`], whose lock
//! serializes HTTP operations with ticks. Tick results reach `WebSocket`
//! clients through a broadcast channel.

use std::sync::Arc;

use serde::Serialize;
use surgitrack_advisor::Advisor;
use surgitrack_core::config::SurgiTrackConfig;
use surgitrack_core::display::DisplayClock;
use surgitrack_core::engine::TickSummary;
use surgitrack_core::runner::EngineHandle;
use surgitrack_core::views::CockpitCard;
use tokio::sync::broadcast;
use ts_rs::TS;

/// Capacity of the tick broadcast channel.
///
/// A subscriber more than this many messages behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 64;

/// Message pushed over `/ws/ticks` after a tick that changed something.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TickBroadcast {
    /// What the tick did.
    pub summary: TickSummary,
    /// The cockpit right after the tick.
    pub cockpit: Vec<CockpitCard>,
}

/// Local calendar window shown by `/api/calendar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarHours {
    /// First hour.
    pub start: u32,
    /// Last hour (exclusive, may be 24).
    pub end: u32,
}

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The engine.
    pub engine: EngineHandle,
    /// Broadcast sender for tick messages.
    pub tx: broadcast::Sender<TickBroadcast>,
    /// Display timezone.
    pub display: DisplayClock,
    /// Calendar window.
    pub calendar_hours: CalendarHours,
    /// Advisory client.
    pub advisor: Arc<Advisor>,
}

impl AppState {
    /// Create the state for `engine`.
    pub fn new(engine: EngineHandle, config: &SurgiTrackConfig, advisor: Advisor) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            engine,
            tx,
            display: DisplayClock::from_config(&config.display),
            calendar_hours: CalendarHours {
                start: config.display.calendar_start_hour,
                end: config.display.calendar_end_hour,
            },
            advisor: Arc::new(advisor),
        }
    }

    /// Subscribe to tick messages.
    pub fn subscribe(&self) -> broadcast::Receiver<TickBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a tick message. Returns the number of receivers; 0 when no
    /// client is connected.
    pub fn broadcast(&self, message: TickBroadcast) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}
