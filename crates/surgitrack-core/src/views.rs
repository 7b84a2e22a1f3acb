//! Read-only projections of the room store for the dashboard.
//!
//! # Views
//!
//! - [`cockpit`] -- one card per room with countdown and progress
//! - [`calendar`] -- per-room blocks for one local day
//! - [`stats`] -- fleet counters
//! - [`advisory_summary`] -- compact payload for the optimization advisor
//!
//! None of these mutate anything; they take the rooms and an instant.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use surgitrack_types::{Operation, OperationId, Room, RoomClass, RoomId, RoomStatus};
use ts_rs::TS;

use crate::display::DisplayClock;
use crate::evaluator::cleaning_duration_for;

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// Status shown to operators.
///
/// Idle rooms with a pending queue entry show `SCHEDULED`; everything else
/// shows the stored status.
pub fn display_status(room: &Room, now: DateTime<Utc>) -> RoomStatus {
    if room.status.is_idle() {
        if room.next_operation(now).is_some() {
            RoomStatus::Scheduled
        } else {
            RoomStatus::Free
        }
    } else {
        room.status
    }
}

/// Time left in the room's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Countdown {
    /// Phase start.
    pub starts_at: DateTime<Utc>,
    /// Phase end.
    pub ends_at: DateTime<Utc>,
    /// Seconds until the end, zero once passed.
    pub remaining_seconds: i64,
    /// Elapsed share of the phase, `0..=100`.
    pub progress_pct: u8,
    /// The phase end has passed while the room is still in a surgical
    /// phase.
    pub overrun: bool,
}

/// Countdown of the current phase, if the room is not idle.
pub fn countdown(room: &Room, now: DateTime<Utc>) -> Option<Countdown> {
    let (start, end) = match room.status {
        RoomStatus::InProgress | RoomStatus::Closing => {
            (room.operation_start_at?, room.effective_operation_end()?)
        }
        RoomStatus::OperationEndedAttention => (room.attention_start_at?, room.attention_end_at?),
        RoomStatus::Disinfection => (room.disinfection_start_at?, room.disinfection_end_at?),
        RoomStatus::Free | RoomStatus::Scheduled => return None,
    };

    let total = end.signed_duration_since(start).num_seconds();
    let elapsed = now.signed_duration_since(start).num_seconds().clamp(0, total.max(0));
    let progress = if total <= 0 {
        100
    } else {
        elapsed
            .checked_mul(100)
            .and_then(|scaled| scaled.checked_div(total))
            .unwrap_or(100)
    };

    Some(Countdown {
        starts_at: start,
        ends_at: end,
        remaining_seconds: end.signed_duration_since(now).num_seconds().max(0),
        progress_pct: u8::try_from(progress.clamp(0, 100)).unwrap_or(100),
        overrun: room.status.has_active_operation() && now > end,
    })
}

// ---------------------------------------------------------------------------
// Cockpit
// ---------------------------------------------------------------------------

/// One room as shown on the cockpit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CockpitCard {
    /// Room id.
    pub room_id: RoomId,
    /// Room name.
    pub name: String,
    /// Room class.
    pub room_class: RoomClass,
    /// Status shown to operators.
    pub status: RoomStatus,
    /// Procedure of the current episode.
    pub procedure: Option<String>,
    /// Surgeon of the current episode.
    pub surgeon: Option<String>,
    /// Operation id of the current episode.
    pub operation_id: Option<OperationId>,
    /// Current phase countdown.
    pub countdown: Option<Countdown>,
    /// Checked checklist items.
    pub checklist_checked: usize,
    /// Checklist size.
    pub checklist_total: usize,
    /// Recorded timeline events.
    pub events_recorded: usize,
    /// Next pending queue entry.
    pub next_operation: Option<Operation>,
    /// Cleaning window of this room, in minutes.
    pub cleaning_minutes: u32,
}

/// Cockpit cards for every room, in id order.
pub fn cockpit(
    rooms: &[Arc<Room>],
    now: DateTime<Utc>,
    default_cleaning_minutes: u32,
) -> Vec<CockpitCard> {
    rooms
        .iter()
        .map(|room| CockpitCard {
            room_id: room.id,
            name: room.name.clone(),
            room_class: room.room_class,
            status: display_status(room, now),
            procedure: room.current_procedure.clone(),
            surgeon: room.surgeon.clone(),
            operation_id: room.current_surgery_id.clone(),
            countdown: countdown(room, now),
            checklist_checked: room.checked_items(),
            checklist_total: room.checklist.len(),
            events_recorded: room.events.len(),
            next_operation: room.next_operation(now).cloned(),
            cleaning_minutes: cleaning_duration_for(room, default_cleaning_minutes),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Kind of a calendar block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum BlockKind {
    /// The running operation.
    Active,
    /// The post-operation attention window.
    Attention,
    /// The disinfection window.
    Disinfection,
    /// A pending queue entry.
    Queued,
    /// A queue entry whose window passed without starting.
    Missed,
}

/// One block on a room's calendar row.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CalendarBlock {
    /// Block kind.
    pub kind: BlockKind,
    /// Operation the block belongs to.
    pub operation_id: Option<OperationId>,
    /// Procedure name, when known.
    pub label: Option<String>,
    /// Surgeon, when known.
    pub surgeon: Option<String>,
    /// Block start (unclipped).
    pub start: DateTime<Utc>,
    /// Block end (unclipped).
    pub end: DateTime<Utc>,
    /// Offset from the window start, percent of the window.
    pub left_pct: f64,
    /// Visible length, percent of the window.
    pub width_pct: f64,
}

/// One room's row.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CalendarRow {
    /// Room id.
    pub room_id: RoomId,
    /// Room name.
    pub name: String,
    /// Blocks in start order.
    pub blocks: Vec<CalendarBlock>,
}

/// The day calendar.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CalendarView {
    /// Local date shown.
    pub date: NaiveDate,
    /// First local hour.
    pub start_hour: u32,
    /// Last local hour (exclusive).
    pub end_hour: u32,
    /// Window start as a UTC instant.
    pub window_start: DateTime<Utc>,
    /// Window end as a UTC instant.
    pub window_end: DateTime<Utc>,
    /// One row per room.
    pub rooms: Vec<CalendarRow>,
}

/// Calendar of `date` between `start_hour` and `end_hour` local time.
///
/// Returns `None` if the window cannot be represented.
pub fn calendar(
    rooms: &[Arc<Room>],
    now: DateTime<Utc>,
    display: &DisplayClock,
    date: NaiveDate,
    start_hour: u32,
    end_hour: u32,
) -> Option<CalendarView> {
    let window_start = display.local_hour(date, start_hour)?;
    let window_end = display.local_hour(date, end_hour)?;
    let window = Window::new(window_start, window_end)?;

    let rows = rooms
        .iter()
        .map(|room| {
            let mut blocks = Vec::new();
            let episode = |kind, start, end| {
                window.block(
                    kind,
                    room.current_surgery_id.clone(),
                    room.current_procedure.clone(),
                    room.surgeon.clone(),
                    start,
                    end,
                )
            };

            if let (Some(start), Some(end)) = (room.operation_start_at, room.effective_operation_end())
            {
                if room.status.has_active_operation() {
                    blocks.extend(episode(BlockKind::Active, start, end));
                }
            }
            if let (Some(start), Some(end)) = (room.attention_start_at, room.attention_end_at) {
                blocks.extend(episode(BlockKind::Attention, start, end));
            }
            if let (Some(start), Some(end)) = (room.disinfection_start_at, room.disinfection_end_at) {
                blocks.extend(episode(BlockKind::Disinfection, start, end));
            }
            for entry in &room.schedule {
                let kind = if entry.is_missed(now) {
                    BlockKind::Missed
                } else {
                    BlockKind::Queued
                };
                blocks.extend(window.block(
                    kind,
                    Some(entry.id.clone()),
                    Some(entry.procedure_name.clone()),
                    Some(entry.surgeon.clone()),
                    entry.start,
                    entry.end,
                ));
            }
            blocks.sort_by_key(|block| block.start);

            CalendarRow {
                room_id: room.id,
                name: room.name.clone(),
                blocks,
            }
        })
        .collect();

    Some(CalendarView {
        date,
        start_hour,
        end_hour,
        window_start,
        window_end,
        rooms: rows,
    })
}

/// A calendar window with its length in seconds.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    seconds: i32,
}

impl Window {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        let seconds = i32::try_from(end.signed_duration_since(start).num_seconds()).ok()?;
        (seconds > 0).then_some(Self {
            start,
            end,
            seconds,
        })
    }

    fn pct(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        let span = i32::try_from(to.signed_duration_since(from).num_seconds()).unwrap_or(0);
        f64::from(span) * 100.0 / f64::from(self.seconds)
    }

    /// The block clipped to the window, or `None` if it lies outside.
    fn block(
        &self,
        kind: BlockKind,
        operation_id: Option<OperationId>,
        label: Option<String>,
        surgeon: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<CalendarBlock> {
        let visible_start = start.max(self.start);
        let visible_end = end.min(self.end);
        if visible_end <= visible_start {
            return None;
        }
        Some(CalendarBlock {
            kind,
            operation_id,
            label,
            surgeon,
            start,
            end,
            left_pct: self.pct(self.start, visible_start),
            width_pct: self.pct(visible_start, visible_end),
        })
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Fleet counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StatsView {
    /// Fleet size.
    pub total_rooms: usize,
    /// Rooms per displayed status.
    pub by_status: BTreeMap<RoomStatus, usize>,
    /// Rooms in a surgical phase, percent of the fleet.
    pub occupancy_pct: u32,
    /// Active and queued operations starting on the local day.
    pub operations_today: usize,
    /// Mean cleaning window across the fleet, in minutes.
    pub mean_turnover_minutes: u32,
    /// Rooms past their planned operation end.
    pub overrunning: Vec<RoomId>,
}

/// Statistics at `now`.
pub fn stats(
    rooms: &[Arc<Room>],
    now: DateTime<Utc>,
    display: &DisplayClock,
    default_cleaning_minutes: u32,
) -> StatsView {
    let today = display.local_date(now);
    let mut by_status: BTreeMap<RoomStatus, usize> = BTreeMap::new();
    let mut surgical: usize = 0;
    let mut operations_today: usize = 0;
    let mut turnover_total: u64 = 0;
    let mut overrunning = Vec::new();

    for room in rooms {
        let entry = by_status.entry(display_status(room, now)).or_default();
        *entry = entry.saturating_add(1);

        if room.status.is_surgical() {
            surgical = surgical.saturating_add(1);
        }
        if room.status.has_active_operation()
            && room
                .operation_start_at
                .is_some_and(|start| display.local_date(start) == today)
        {
            operations_today = operations_today.saturating_add(1);
        }
        let queued_today = room
            .schedule
            .iter()
            .filter(|entry| display.local_date(entry.start) == today)
            .count();
        operations_today = operations_today.saturating_add(queued_today);

        turnover_total = turnover_total
            .saturating_add(u64::from(cleaning_duration_for(room, default_cleaning_minutes)));

        if countdown(room, now).is_some_and(|c| c.overrun) {
            overrunning.push(room.id);
        }
    }

    let total = rooms.len();
    let occupancy_pct = surgical
        .saturating_mul(100)
        .checked_div(total)
        .and_then(|pct| u32::try_from(pct).ok())
        .unwrap_or(0);
    let mean_turnover_minutes = u64::try_from(total)
        .ok()
        .and_then(|n| turnover_total.checked_div(n))
        .and_then(|mean| u32::try_from(mean).ok())
        .unwrap_or(default_cleaning_minutes);

    StatsView {
        total_rooms: total,
        by_status,
        occupancy_pct,
        operations_today,
        mean_turnover_minutes,
        overrunning,
    }
}

// ---------------------------------------------------------------------------
// Advisory summary
// ---------------------------------------------------------------------------

/// A queued operation as sent to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryOperation {
    /// Procedure.
    pub procedure: String,
    /// Surgeon.
    pub surgeon: String,
    /// Planned start, local `HH:MM`.
    pub start: String,
    /// Planned end, local `HH:MM`.
    pub end: String,
}

/// A room as sent to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRoom {
    /// Room name.
    pub name: String,
    /// Room class.
    pub room_class: RoomClass,
    /// Displayed status.
    pub status: RoomStatus,
    /// Current procedure.
    pub procedure: Option<String>,
    /// Current surgeon.
    pub surgeon: Option<String>,
    /// End of the current phase, local `HH:MM`.
    pub phase_ends: Option<String>,
    /// Whether the operation is past its planned end.
    pub overrun: bool,
    /// Pending queue entries.
    pub queued: Vec<AdvisoryOperation>,
}

/// The serializable block situation the advisor analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorySummary {
    /// Local time of the summary, `DD/MM/YYYY HH:MM:SS`.
    pub generated_at: String,
    /// Every room.
    pub rooms: Vec<AdvisoryRoom>,
}

/// Build the advisor payload.
pub fn advisory_summary(
    rooms: &[Arc<Room>],
    now: DateTime<Utc>,
    display: &DisplayClock,
) -> AdvisorySummary {
    let rooms = rooms
        .iter()
        .map(|room| {
            let countdown = countdown(room, now);
            AdvisoryRoom {
                name: room.name.clone(),
                room_class: room.room_class,
                status: display_status(room, now),
                procedure: room.current_procedure.clone(),
                surgeon: room.surgeon.clone(),
                phase_ends: countdown.map(|c| display.format_time(c.ends_at)),
                overrun: countdown.is_some_and(|c| c.overrun),
                queued: room
                    .schedule
                    .iter()
                    .filter(|entry| entry.end > now)
                    .map(|entry| AdvisoryOperation {
                        procedure: entry.procedure_name.clone(),
                        surgeon: entry.surgeon.clone(),
                        start: display.format_time(entry.start),
                        end: display.format_time(entry.end),
                    })
                    .collect(),
            }
        })
        .collect();

    AdvisorySummary {
        generated_at: display.format_date_time(now),
        rooms,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::DisplayConfig;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn utc_display() -> DisplayClock {
        DisplayClock::from_config(&DisplayConfig {
            utc_offset_minutes: 0,
            ..DisplayConfig::default()
        })
    }

    fn op(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Operation {
        Operation {
            id: OperationId::from(id),
            patient_id: None,
            procedure_name: "Pontage".to_owned(),
            surgeon: "Dr. Alain Prost".to_owned(),
            room_id: RoomId(1),
            start,
            end,
            created_at: at(7, 0),
        }
    }

    fn idle(id: u32) -> Room {
        Room::idle(RoomId(id), format!("Salle {id}"), RoomClass::Standard, None, vec![])
    }

    fn busy(id: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Room {
        let mut room = idle(id);
        room.status = RoomStatus::InProgress;
        room.current_surgery_id = Some(OperationId::from("op-busy"));
        room.current_procedure = Some("Craniotomie".to_owned());
        room.operation_start_at = Some(start);
        room.operation_end_at = Some(end);
        room
    }

    #[test]
    fn idle_room_with_pending_entry_displays_scheduled() {
        let mut room = idle(1);
        assert_eq!(display_status(&room, at(8, 0)), RoomStatus::Free);
        room.schedule.push(op("op-1", at(9, 0), at(10, 0)));
        assert_eq!(display_status(&room, at(8, 0)), RoomStatus::Scheduled);
        assert_eq!(display_status(&room, at(10, 0)), RoomStatus::Free);
    }

    #[test]
    fn countdown_progress_and_overrun() {
        let room = busy(1, at(9, 0), at(11, 0));
        let c = countdown(&room, at(10, 0)).unwrap();
        assert_eq!(c.progress_pct, 50);
        assert_eq!(c.remaining_seconds, 3600);
        assert!(!c.overrun);

        let mut closing = room;
        closing.status = RoomStatus::Closing;
        let c = countdown(&closing, at(11, 30)).unwrap();
        assert_eq!(c.progress_pct, 100);
        assert_eq!(c.remaining_seconds, 0);
        assert!(c.overrun);

        assert!(countdown(&idle(2), at(10, 0)).is_none());
    }

    #[test]
    fn cockpit_lists_every_room() {
        let rooms = vec![Arc::new(busy(1, at(9, 0), at(11, 0))), Arc::new(idle(2))];
        let cards = cockpit(&rooms, at(10, 0), 20);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].status, RoomStatus::InProgress);
        assert_eq!(cards[0].procedure.as_deref(), Some("Craniotomie"));
        assert_eq!(cards[1].status, RoomStatus::Free);
        assert_eq!(cards[1].cleaning_minutes, 20);
    }

    #[test]
    fn calendar_blocks_are_clipped_and_missed_entries_marked() {
        let mut room = busy(1, at(7, 0), at(10, 0));
        room.schedule.push(op("op-late", at(19, 0), at(21, 0)));
        room.schedule.push(op("op-missed", at(8, 0), at(9, 0)));
        let rooms = vec![Arc::new(room)];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let view = calendar(&rooms, at(9, 30), &utc_display(), date, 8, 20).unwrap();
        let blocks = &view.rooms[0].blocks;
        assert_eq!(blocks.len(), 3);

        assert_eq!(blocks[0].kind, BlockKind::Active);
        assert_eq!(blocks[0].left_pct, 0.0);
        assert!((blocks[0].width_pct - 200.0 / 12.0).abs() < 1e-9);

        assert_eq!(blocks[1].kind, BlockKind::Missed);
        assert_eq!(blocks[2].kind, BlockKind::Queued);
        assert!((blocks[2].left_pct - 1100.0 / 12.0).abs() < 1e-9);
        assert!((blocks[2].width_pct - 100.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn block_outside_window_is_omitted() {
        let mut room = idle(1);
        room.schedule.push(op("op-night", at(21, 0), at(22, 0)));
        let rooms = vec![Arc::new(room)];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let view = calendar(&rooms, at(9, 0), &utc_display(), date, 8, 20).unwrap();
        assert!(view.rooms[0].blocks.is_empty());
    }

    #[test]
    fn stats_count_occupancy_and_overruns() {
        let mut queued = idle(3);
        queued.schedule.push(op("op-3", at(14, 0), at(15, 0)));
        let rooms = vec![
            Arc::new(busy(1, at(9, 0), at(10, 0))),
            Arc::new(busy(2, at(9, 0), at(12, 0))),
            Arc::new(queued),
            Arc::new(idle(4)),
        ];
        let view = stats(&rooms, at(10, 30), &utc_display(), 20);
        assert_eq!(view.total_rooms, 4);
        assert_eq!(view.occupancy_pct, 50);
        assert_eq!(view.operations_today, 3);
        assert_eq!(view.mean_turnover_minutes, 20);
        assert_eq!(view.overrunning, vec![RoomId(1)]);
        assert_eq!(view.by_status.get(&RoomStatus::InProgress), Some(&2));
        assert_eq!(view.by_status.get(&RoomStatus::Scheduled), Some(&1));
        assert_eq!(view.by_status.get(&RoomStatus::Free), Some(&1));
    }

    #[test]
    fn advisory_summary_skips_finished_entries() {
        let mut room = busy(1, at(9, 0), at(11, 0));
        room.schedule.push(op("op-old", at(7, 0), at(8, 0)));
        room.schedule.push(op("op-next", at(12, 0), at(13, 0)));
        let summary = advisory_summary(&[Arc::new(room)], at(10, 0), &utc_display());
        assert_eq!(summary.generated_at, "02/03/2026 10:00:00");
        assert_eq!(summary.rooms[0].queued.len(), 1);
        assert_eq!(summary.rooms[0].queued[0].start, "12:00");
        assert_eq!(summary.rooms[0].phase_ends.as_deref(), Some("11:00"));
    }
}
