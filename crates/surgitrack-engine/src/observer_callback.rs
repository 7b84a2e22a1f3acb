//! Tick callback that feeds the observer's `WebSocket` stream.

use std::sync::Arc;

use surgitrack_core::engine::TickSummary;
use surgitrack_core::runner::TickCallback;
use surgitrack_core::views;
use surgitrack_observer::{AppState, TickBroadcast};
use surgitrack_types::Room;
use tracing::debug;

/// Callback that bridges the tick loop to the observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
    default_cleaning_minutes: u32,
}

impl ObserverCallback {
    /// Create a callback publishing through `state`.
    pub const fn new(state: Arc<AppState>, default_cleaning_minutes: u32) -> Self {
        Self {
            state,
            default_cleaning_minutes,
        }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, summary: &TickSummary, rooms: &[Arc<Room>]) {
        if summary.is_noop() && !summary.persisted {
            return;
        }
        let message = TickBroadcast {
            summary: summary.clone(),
            cockpit: views::cockpit(rooms, summary.at, self.default_cleaning_minutes),
        };
        let receivers = self.state.broadcast(message);
        debug!(tick = summary.tick, receivers, "Tick broadcast sent");
    }
}
