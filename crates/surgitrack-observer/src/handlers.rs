//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/rooms` | All rooms |
//! | `GET` | `/api/rooms/{id}` | One room |
//! | `GET` | `/api/cockpit` | Cockpit cards |
//! | `GET` | `/api/calendar` | Day calendar (`?date=YYYY-MM-DD`) |
//! | `GET` | `/api/stats` | Fleet statistics |
//! | `GET` | `/api/staff` | Staff directory |
//! | `POST` | `/api/rooms/{id}/schedule` | Queue an operation |
//! | `DELETE` | `/api/rooms/{id}/schedule/{operation_id}` | Cancel a queued operation |
//! | `POST` | `/api/rooms/{id}/events` | Record a timeline event |
//! | `POST` | `/api/rooms/{id}/extend` | Extend the running operation |
//! | `POST` | `/api/rooms/{id}/finish-cleaning` | End disinfection early |
//! | `POST` | `/api/rooms/{id}/checklist/{item_id}/toggle` | Toggle a checklist item |
//! | `PUT` | `/api/rooms/{id}/asepsis-profile` | Replace the asepsis profile |
//! | `POST` | `/api/advice` | Ask the advisor |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use surgitrack_core::engine::OperationRequest;
use surgitrack_core::views;
use surgitrack_types::{
    AsepsisProfile, ChecklistItemId, OperationId, Room, RoomId, RoomStatus, TimelineEventKind,
};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies and query parameters
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/calendar`.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// Local date, `YYYY-MM-DD`. Defaults to today.
    pub date: Option<String>,
}

/// Body of `POST /api/rooms/{id}/events`.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    /// Milestone kind.
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    /// Who recorded it.
    pub user: String,
    /// When it happened; defaults to now.
    #[serde(default, alias = "time")]
    pub at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/rooms/{id}/extend`.
#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    /// Minutes to add to the planned end.
    pub minutes: u32,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with fleet counters and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tick, now, rooms) = {
        let engine = state.engine.lock().await;
        (engine.tick_count(), engine.now(), engine.rooms())
    };
    let local_time = state.display.format_date_time(now);
    let total = rooms.len();
    let count = |status: RoomStatus| {
        rooms
            .iter()
            .filter(|room| views::display_status(room, now) == status)
            .count()
    };
    let busy = rooms.iter().filter(|room| room.status.is_surgical()).count();
    let cleaning = count(RoomStatus::Disinfection);
    let free = count(RoomStatus::Free);
    let scheduled = count(RoomStatus::Scheduled);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="utf-8">
    <title>SurgiTrack</title>
    <style>
        body {{
            background: #0b1220;
            color: #d0d7e2;
            font-family: 'Inter', 'Segoe UI', sans-serif;
            padding: 2rem;
            max-width: 860px;
            margin: 0 auto;
        }}
        h1 {{ color: #38bdf8; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b97a8; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #111a2e;
            border: 1px solid #24324d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 110px;
        }}
        .metric .label {{ color: #8b97a8; font-size: 0.85rem; }}
        .metric .value {{ color: #38bdf8; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #38bdf8; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #24324d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>SurgiTrack</h1>
    <p class="subtitle">Bloc opératoire -- {local_time}</p>

    <div>
        <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
        <div class="metric"><div class="label">Salles</div><div class="value">{total}</div></div>
        <div class="metric"><div class="label">Occupées</div><div class="value">{busy}</div></div>
        <div class="metric"><div class="label">Nettoyage</div><div class="value">{cleaning}</div></div>
        <div class="metric"><div class="label">Programmées</div><div class="value">{scheduled}</div></div>
        <div class="metric"><div class="label">Libres</div><div class="value">{free}</div></div>
    </div>

    <hr>

    <h2>API</h2>
    <ul>
        <li><a href="/api/rooms">/api/rooms</a> -- Rooms</li>
        <li><a href="/api/cockpit">/api/cockpit</a> -- Cockpit</li>
        <li><a href="/api/calendar">/api/calendar</a> -- Day calendar (?date=YYYY-MM-DD)</li>
        <li><a href="/api/stats">/api/stats</a> -- Statistics</li>
        <li><a href="/api/staff">/api/staff</a> -- Staff directory</li>
        <li><code>ws://host:port/ws/ticks</code> -- Live tick stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// List every room.
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let rooms = state.engine.lock().await.rooms();
    let rooms: Vec<&Room> = rooms.iter().map(AsRef::as_ref).collect();
    Ok(Json(serde_json::json!({
        "count": rooms.len(),
        "rooms": rooms,
    })))
}

/// Return one room.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ObserverError> {
    let room = state.engine.lock().await.room(RoomId(id))?;
    Ok(Json(serde_json::to_value(room.as_ref())?))
}

/// Cockpit cards.
pub async fn get_cockpit(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let cards = {
        let engine = state.engine.lock().await;
        views::cockpit(
            &engine.rooms(),
            engine.now(),
            engine.catalog().default_cleaning_minutes(),
        )
    };
    Ok(Json(cards))
}

/// Day calendar.
///
/// # Query Parameters
///
/// - `date`: local date `YYYY-MM-DD` (default: today)
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let (rooms, now) = {
        let engine = state.engine.lock().await;
        (engine.rooms(), engine.now())
    };
    let date = match params.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| ObserverError::InvalidQuery(format!("date {raw}: {e}")))?,
        None => state.display.local_date(now),
    };
    let hours = state.calendar_hours;
    let view = views::calendar(&rooms, now, &state.display, date, hours.start, hours.end)
        .ok_or_else(|| ObserverError::InvalidQuery(format!("date {date} is out of range")))?;
    Ok(Json(view))
}

/// Fleet statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let stats = {
        let engine = state.engine.lock().await;
        views::stats(
            &engine.rooms(),
            engine.now(),
            &state.display,
            engine.catalog().default_cleaning_minutes(),
        )
    };
    Ok(Json(stats))
}

/// Staff directory.
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let staff = state.engine.lock().await.catalog().staff().to_vec();
    Ok(Json(serde_json::json!({
        "count": staff.len(),
        "staff": staff,
    })))
}

// ---------------------------------------------------------------------------
// Engine operations
// ---------------------------------------------------------------------------

/// Queue an operation. Responds `201 Created` with the stored operation.
pub async fn schedule_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(request): Json<OperationRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let operation = state
        .engine
        .lock()
        .await
        .schedule_operation(RoomId(id), request)?;
    Ok((StatusCode::CREATED, Json(operation)))
}

/// Remove a queued operation.
pub async fn cancel_operation(
    State(state): State<Arc<AppState>>,
    Path((id, operation_id)): Path<(u32, String)>,
) -> Result<impl IntoResponse, ObserverError> {
    let removed = state
        .engine
        .lock()
        .await
        .cancel_scheduled_operation(RoomId(id), &OperationId::from(operation_id))?;
    Ok(Json(removed))
}

/// Record a timeline event.
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(request): Json<EventRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let room = state.engine.lock().await.record_event(
        RoomId(id),
        request.kind,
        &request.user,
        request.at,
    )?;
    Ok(Json(serde_json::to_value(room.as_ref())?))
}

/// Extend the running operation.
pub async fn extend_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(request): Json<ExtendRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let room = state
        .engine
        .lock()
        .await
        .extend_operation(RoomId(id), request.minutes)?;
    Ok(Json(serde_json::to_value(room.as_ref())?))
}

/// End a running disinfection now.
pub async fn finish_cleaning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ObserverError> {
    let room = state.engine.lock().await.finish_cleaning_early(RoomId(id))?;
    Ok(Json(serde_json::to_value(room.as_ref())?))
}

/// Toggle a checklist item.
pub async fn toggle_checklist_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(u32, String)>,
) -> Result<impl IntoResponse, ObserverError> {
    let item = state
        .engine
        .lock()
        .await
        .toggle_checklist_item(RoomId(id), &ChecklistItemId::from(item_id))?;
    Ok(Json(item))
}

/// Replace a hyper-septic room's asepsis profile.
pub async fn update_asepsis_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(profile): Json<AsepsisProfile>,
) -> Result<impl IntoResponse, ObserverError> {
    let room = state
        .engine
        .lock()
        .await
        .update_asepsis_profile(RoomId(id), profile)?;
    Ok(Json(serde_json::to_value(room.as_ref())?))
}

// ---------------------------------------------------------------------------
// Advisor
// ---------------------------------------------------------------------------

/// Ask the advisor about the current block. Always `200`: advisor
/// failures come back as a fallback with `softError` set.
pub async fn get_advice(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = {
        let engine = state.engine.lock().await;
        views::advisory_summary(&engine.rooms(), engine.now(), &state.display)
    };
    Json(state.advisor.advise(&summary).await)
}
