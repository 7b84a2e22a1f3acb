//! HTTP and `WebSocket` surface for the SurgiTrack time engine.
//!
//! - **REST reads** (`/api/rooms`, `/api/cockpit`, `/api/calendar`,
//!   `/api/stats`, `/api/staff`) served from the engine's current rooms
//! - **REST operations** mapping one-to-one onto the engine's imperative
//!   operations, with engine errors turned into 404/400/409 responses
//! - **`WebSocket`** (`/ws/ticks`) streaming tick results
//! - **Advisor** (`/api/advice`), which never fails the request
//!
//! Every request takes the engine lock for the duration of its engine
//! call, so HTTP operations and ticks never interleave.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use state::{AppState, TickBroadcast};
