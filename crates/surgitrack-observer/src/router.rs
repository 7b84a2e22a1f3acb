//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: status page, REST API and `WebSocket`.
///
/// CORS allows any origin so a separately served dashboard can call in.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/ticks", get(ws::ws_ticks))
        // Read models
        .route("/api/rooms", get(handlers::list_rooms))
        .route("/api/rooms/{id}", get(handlers::get_room))
        .route("/api/cockpit", get(handlers::get_cockpit))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/staff", get(handlers::list_staff))
        // Engine operations
        .route("/api/rooms/{id}/schedule", post(handlers::schedule_operation))
        .route(
            "/api/rooms/{id}/schedule/{operation_id}",
            delete(handlers::cancel_operation),
        )
        .route("/api/rooms/{id}/events", post(handlers::record_event))
        .route("/api/rooms/{id}/extend", post(handlers::extend_operation))
        .route("/api/rooms/{id}/finish-cleaning", post(handlers::finish_cleaning))
        .route(
            "/api/rooms/{id}/checklist/{item_id}/toggle",
            post(handlers::toggle_checklist_item),
        )
        .route(
            "/api/rooms/{id}/asepsis-profile",
            put(handlers::update_asepsis_profile),
        )
        .route("/api/advice", post(handlers::get_advice))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
