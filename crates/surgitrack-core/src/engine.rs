//! The time engine: single owner of the room store.
//!
//! Every mutation goes through [`TimeEngine`]: the periodic [`tick`]
//! (evaluator pass over all rooms) and the imperative operations invoked
//! by operators. Each call runs to completion, including persistence,
//! before the next is accepted; callers serialize access through
//! [`EngineHandle`](crate::runner::EngineHandle).
//!
//! [`tick`]: TimeEngine::tick

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surgitrack_db::SnapshotSlot;
use surgitrack_types::{
    AsepsisProfile, ChecklistItem, ChecklistItemId, Operation, OperationId, Room, RoomClass,
    RoomId, RoomStatus, TimelineEvent, TimelineEventKind,
};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::clock::Clock;
use crate::config::SurgiTrackConfig;
use crate::error::EngineError;
use crate::evaluator::{
    self, EvaluationPolicy, Transition, check_consistency, cleaning_duration_for, plus_minutes,
    reset_to_free,
};
use crate::fleet::{self, FleetCatalog};
use crate::schedule;
use crate::store::{LoadReport, RoomStore, StoreError};

/// An operator's request to queue an operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct OperationRequest {
    /// Operation id; generated when absent.
    #[serde(default)]
    pub id: Option<OperationId>,
    /// Patient reference.
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Procedure name.
    #[serde(alias = "procedure")]
    pub procedure_name: String,
    /// Surgeon.
    pub surgeon: String,
    /// Planned start.
    pub start: DateTime<Utc>,
    /// Planned end.
    pub end: DateTime<Utc>,
}

/// A room whose evaluation failed during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoomFailure {
    /// The room.
    pub room_id: RoomId,
    /// What went wrong.
    pub error: String,
}

/// Outcome of one evaluator pass over the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TickSummary {
    /// Tick number (the startup catch-up is tick 1).
    pub tick: u64,
    /// Evaluation instant.
    pub at: DateTime<Utc>,
    /// Transitions applied, room by room.
    pub transitions: Vec<Transition>,
    /// Rooms whose evaluation failed; their state was left untouched.
    pub failures: Vec<RoomFailure>,
    /// Whether a snapshot was written.
    pub persisted: bool,
    /// Why the snapshot write failed, if it did.
    pub persist_error: Option<String>,
}

impl TickSummary {
    /// Whether anything changed or failed.
    pub fn is_noop(&self) -> bool {
        self.transitions.is_empty() && self.failures.is_empty()
    }
}

/// Result of opening the engine.
#[derive(Debug, Clone)]
pub struct Startup {
    /// How the persisted snapshot was loaded.
    pub load: LoadReport,
    /// The catch-up pass run right after loading.
    pub catch_up: TickSummary,
}

/// Owner of the room store and the lifecycle rules.
#[derive(Debug)]
pub struct TimeEngine {
    store: RoomStore,
    catalog: Arc<FleetCatalog>,
    clock: Arc<dyn Clock>,
    policy: EvaluationPolicy,
    tick: u64,
}

impl TimeEngine {
    /// Load the snapshot from `slot`, normalize it, and run one catch-up
    /// evaluation at the clock's current instant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the slot cannot be read.
    pub fn open(
        config: &SurgiTrackConfig,
        slot: Box<dyn SnapshotSlot>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, Startup), StoreError> {
        let catalog = Arc::new(FleetCatalog::from_config(config));
        let (store, load) = RoomStore::open(slot, &catalog, clock.now())?;
        let mut engine = Self {
            store,
            catalog,
            clock,
            policy: EvaluationPolicy::from_config(config),
            tick: 0,
        };
        let catch_up = engine.tick();
        info!(
            transitions = catch_up.transitions.len(),
            failures = catch_up.failures.len(),
            "Catch-up evaluation complete"
        );
        Ok((engine, Startup { load, catch_up }))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The engine's current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of ticks run so far.
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The static fleet catalog.
    pub fn catalog(&self) -> &FleetCatalog {
        &self.catalog
    }

    /// The evaluation policy.
    pub const fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    /// A point-in-time copy of every room handle, in id order.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.store.snapshot()
    }

    /// The room with `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`] if it is not in the fleet.
    pub fn room(&self, room_id: RoomId) -> Result<Arc<Room>, EngineError> {
        self.store
            .get(room_id)
            .ok_or(EngineError::UnknownRoom { room_id })
    }

    /// Whether unsaved changes exist.
    pub const fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Evaluate every room at the clock's current instant and persist if
    /// anything changed. A failing room is reported and skipped; the
    /// others still advance.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.clock.now();
        self.tick = self.tick.saturating_add(1);

        let mut transitions = Vec::new();
        let mut failures = Vec::new();
        for room in self.store.snapshot() {
            match evaluator::evaluate(&room, now, &self.policy) {
                Ok(Some(evaluation)) => {
                    for t in &evaluation.transitions {
                        info!(
                            tick = self.tick,
                            room_id = %t.room_id,
                            rule = ?t.rule,
                            from = %t.from,
                            to = %t.to,
                            at = %t.at,
                            "Room transition"
                        );
                    }
                    transitions.extend(evaluation.transitions);
                    self.store.replace(evaluation.room);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(tick = self.tick, room_id = %room.id, error = %e, "Room evaluation failed");
                    failures.push(RoomFailure {
                        room_id: room.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let (persisted, persist_error) = if self.store.is_dirty() {
            match self.store.persist(now) {
                Ok(written) => (written, None),
                Err(e) => {
                    warn!(tick = self.tick, error = %e, "Snapshot write failed; will retry");
                    (false, Some(e.to_string()))
                }
            }
        } else {
            debug!(tick = self.tick, "No-op tick");
            (false, None)
        };

        TickSummary {
            tick: self.tick,
            at: now,
            transitions,
            failures,
            persisted,
            persist_error,
        }
    }

    // =========================================================================
    // Imperative operations
    // =========================================================================

    /// Queue an operation in a room. Does not change the room's status;
    /// the next tick starts it if its window contains the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`], [`EngineError::InvalidInterval`]
    /// or [`EngineError::DuplicateOperation`].
    pub fn schedule_operation(
        &mut self,
        room_id: RoomId,
        request: OperationRequest,
    ) -> Result<Operation, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        let operation = Operation {
            id: request.id.unwrap_or_else(OperationId::generate),
            patient_id: request.patient_id,
            procedure_name: request.procedure_name,
            surgeon: request.surgeon,
            room_id,
            start: request.start,
            end: request.end,
            created_at: now,
        };
        schedule::insert(&mut room.schedule, room_id, operation.clone())?;
        self.commit(room, now)?;
        info!(
            room_id = %room_id,
            operation_id = %operation.id,
            start = %operation.start,
            end = %operation.end,
            "Operation scheduled"
        );
        Ok(operation)
    }

    /// Remove a pending queue entry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`] or
    /// [`EngineError::UnknownOperation`].
    pub fn cancel_scheduled_operation(
        &mut self,
        room_id: RoomId,
        operation_id: &OperationId,
    ) -> Result<Operation, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        let removed = schedule::remove(&mut room.schedule, room_id, operation_id)?;
        self.commit(room, now)?;
        info!(room_id = %room_id, operation_id = %operation_id, "Queued operation cancelled");
        Ok(removed)
    }

    /// Record a timeline milestone at `at` (default: now).
    ///
    /// A kind already recorded in this episode is updated in place.
    /// `CLOSURE` moves an `IN_PROGRESS` room to `CLOSING`; `PATIENT_EXIT`
    /// ends the operation and opens the disinfection window at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`],
    /// [`EngineError::NoActiveOperation`],
    /// [`EngineError::EventBeforeOperationStart`] or
    /// [`EngineError::TimeOverflow`].
    pub fn record_event(
        &mut self,
        room_id: RoomId,
        kind: TimelineEventKind,
        user: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Arc<Room>, EngineError> {
        let now = self.clock.now();
        let at = at.unwrap_or(now);
        let mut room = self.working_copy(room_id)?;
        let from = room.status;

        if !from.has_active_operation() {
            return Err(EngineError::NoActiveOperation {
                room_id,
                status: from,
            });
        }
        if let Some(operation_start) = room.operation_start_at {
            if at < operation_start {
                return Err(EngineError::EventBeforeOperationStart {
                    room_id,
                    at,
                    operation_start,
                });
            }
        }

        if let Some(existing) = room.events.iter_mut().find(|e| e.kind == kind) {
            existing.time = at;
            user.clone_into(&mut existing.user);
        } else {
            room.events.push(TimelineEvent {
                kind,
                time: at,
                user: user.to_owned(),
            });
        }

        match kind {
            TimelineEventKind::Closure if from == RoomStatus::InProgress => {
                room.status = RoomStatus::Closing;
            }
            TimelineEventKind::PatientExit => {
                let minutes = cleaning_duration_for(&room, self.policy.default_cleaning_minutes);
                let cleaning_end = plus_minutes(at, minutes).ok_or(EngineError::TimeOverflow)?;
                room.status = RoomStatus::Disinfection;
                room.operation_end_at = Some(at);
                room.legacy_end_time = None;
                room.disinfection_start_at = Some(at);
                room.disinfection_end_at = Some(cleaning_end);
                room.attention_start_at = None;
                room.attention_end_at = None;
            }
            _ => {}
        }

        let to = room.status;
        let room = self.commit(room, now)?;
        info!(
            room_id = %room_id,
            event = ?kind,
            at = %at,
            from = %from,
            to = %to,
            "Timeline event recorded"
        );
        Ok(room)
    }

    /// Push the planned end of a running operation back by `minutes`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`],
    /// [`EngineError::IllegalTransition`] unless the room is `IN_PROGRESS`,
    /// or [`EngineError::TimeOverflow`].
    pub fn extend_operation(
        &mut self,
        room_id: RoomId,
        minutes: u32,
    ) -> Result<Arc<Room>, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        if room.status != RoomStatus::InProgress {
            return Err(EngineError::IllegalTransition {
                room_id,
                operation: "extend",
                status: room.status,
            });
        }
        let current_end = room
            .effective_operation_end()
            .ok_or(EngineError::IllegalTransition {
                room_id,
                operation: "extend",
                status: room.status,
            })?;
        let new_end = plus_minutes(current_end, minutes).ok_or(EngineError::TimeOverflow)?;
        room.operation_end_at = Some(new_end);
        room.legacy_end_time = None;
        let room = self.commit(room, now)?;
        info!(room_id = %room_id, minutes, new_end = %new_end, "Operation extended");
        Ok(room)
    }

    /// End a running disinfection now and free the room.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`] or
    /// [`EngineError::IllegalTransition`] unless the room is in
    /// `DISINFECTION`.
    pub fn finish_cleaning_early(&mut self, room_id: RoomId) -> Result<Arc<Room>, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        if room.status != RoomStatus::Disinfection {
            return Err(EngineError::IllegalTransition {
                room_id,
                operation: "finish cleaning in",
                status: room.status,
            });
        }
        reset_to_free(&mut room);
        let room = self.commit(room, now)?;
        info!(room_id = %room_id, "Disinfection finished early");
        Ok(room)
    }

    /// Flip a checklist item.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`] or [`EngineError::UnknownItem`].
    pub fn toggle_checklist_item(
        &mut self,
        room_id: RoomId,
        item_id: &ChecklistItemId,
    ) -> Result<ChecklistItem, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        let item = room
            .checklist
            .iter_mut()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| EngineError::UnknownItem {
                room_id,
                item_id: item_id.clone(),
            })?;
        item.checked = !item.checked;
        let toggled = item.clone();
        self.commit(room, now)?;
        debug!(room_id = %room_id, item_id = %item_id, checked = toggled.checked, "Checklist item toggled");
        Ok(toggled)
    }

    /// Replace a hyper-septic room's asepsis profile. A disinfection
    /// window already running keeps its end; only later windows use the
    /// new duration. The static configuration wins again on the next load.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRoom`] or
    /// [`EngineError::InvalidProfile`] if the profile fails validation or
    /// the room is a standard room.
    pub fn update_asepsis_profile(
        &mut self,
        room_id: RoomId,
        profile: AsepsisProfile,
    ) -> Result<Arc<Room>, EngineError> {
        let now = self.clock.now();
        let mut room = self.working_copy(room_id)?;
        if room.room_class != RoomClass::HyperSeptic {
            return Err(EngineError::InvalidProfile {
                room_id,
                reason: "standard rooms carry no asepsis profile".to_owned(),
            });
        }
        fleet::check_profile(&profile)
            .map_err(|reason| EngineError::InvalidProfile { room_id, reason })?;
        room.asepsis_profile = Some(profile);
        let room = self.commit(room, now)?;
        info!(room_id = %room_id, "Asepsis profile updated");
        Ok(room)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn working_copy(&self, room_id: RoomId) -> Result<Room, EngineError> {
        self.room(room_id).map(|room| Room::clone(&room))
    }

    /// Check, store and persist a changed room. A failed write is logged
    /// and retried with the next change or tick.
    fn commit(&mut self, room: Room, now: DateTime<Utc>) -> Result<Arc<Room>, EngineError> {
        check_consistency(&room)?;
        let room = self.store.replace(room);
        if let Err(e) = self.store.persist(now) {
            warn!(room_id = %room.id, error = %e, "Snapshot write failed; will retry");
        }
        Ok(room)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use surgitrack_db::MemorySlot;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::default_hyper_septic_profile;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn config() -> SurgiTrackConfig {
        let mut config = SurgiTrackConfig::default();
        config.fleet.room_count = 3;
        config.fleet.hyper_septic_rooms = vec![3];
        config
    }

    fn engine_at(start: DateTime<Utc>) -> (TimeEngine, ManualClock, MemorySlot) {
        let clock = ManualClock::new(start);
        let slot = MemorySlot::new("surgiTrack_rooms");
        let (engine, _) =
            TimeEngine::open(&config(), Box::new(slot.clone()), Arc::new(clock.clone())).unwrap();
        (engine, clock, slot)
    }

    fn request(start: DateTime<Utc>, end: DateTime<Utc>) -> OperationRequest {
        OperationRequest {
            id: Some(OperationId::from("op-1")),
            patient_id: Some("PT-8821".to_owned()),
            procedure_name: "Appendectomy".to_owned(),
            surgeon: "Dr. House".to_owned(),
            start,
            end,
        }
    }

    fn start_operation(engine: &mut TimeEngine, clock: &ManualClock, room: u32) {
        engine
            .schedule_operation(RoomId(room), request(at(9, 0), at(11, 0)))
            .unwrap();
        clock.set(at(9, 0));
        engine.tick();
    }

    #[test]
    fn open_persists_fresh_fleet() {
        let (engine, _, slot) = engine_at(at(8, 0));
        assert_eq!(engine.rooms().len(), 3);
        assert_eq!(slot.write_count(), 1);
        assert!(!engine.has_unsaved_changes());
    }

    #[test]
    fn schedule_does_not_change_status() {
        let (mut engine, _, _) = engine_at(at(9, 30));
        let op = engine
            .schedule_operation(RoomId(1), request(at(9, 0), at(11, 0)))
            .unwrap();
        assert_eq!(op.created_at, at(9, 30));
        assert_eq!(op.room_id, RoomId(1));
        assert_eq!(engine.room(RoomId(1)).unwrap().status, RoomStatus::Free);

        let summary = engine.tick();
        assert_eq!(summary.transitions.len(), 1);
        assert_eq!(engine.room(RoomId(1)).unwrap().status, RoomStatus::InProgress);
    }

    #[test]
    fn schedule_errors() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        let err = engine
            .schedule_operation(RoomId(9), request(at(9, 0), at(10, 0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownRoom { .. }));

        let err = engine
            .schedule_operation(RoomId(1), request(at(10, 0), at(10, 0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInterval { .. }));
        assert!(engine.room(RoomId(1)).unwrap().schedule.is_empty());
    }

    #[test]
    fn generated_ids_are_used_when_absent() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        let mut req = request(at(9, 0), at(10, 0));
        req.id = None;
        let op = engine.schedule_operation(RoomId(1), req).unwrap();
        assert!(op.id.as_str().starts_with("op-"));
    }

    #[test]
    fn cancel_removes_entry() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        engine
            .schedule_operation(RoomId(1), request(at(9, 0), at(10, 0)))
            .unwrap();
        engine
            .cancel_scheduled_operation(RoomId(1), &OperationId::from("op-1"))
            .unwrap();
        assert!(engine.room(RoomId(1)).unwrap().schedule.is_empty());
        let err = engine
            .cancel_scheduled_operation(RoomId(1), &OperationId::from("op-1"))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownOperation { .. }));
    }

    #[test]
    fn event_requires_active_operation() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        let err = engine
            .record_event(RoomId(1), TimelineEventKind::Incision, "Dr. House", None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoActiveOperation { status: RoomStatus::Free, .. }));
    }

    #[test]
    fn event_before_start_is_rejected() {
        let (mut engine, clock, _) = engine_at(at(8, 0));
        start_operation(&mut engine, &clock, 1);
        let err = engine
            .record_event(RoomId(1), TimelineEventKind::Incision, "Dr. House", Some(at(8, 59)))
            .unwrap_err();
        assert!(matches!(err, EngineError::EventBeforeOperationStart { .. }));
    }

    #[test]
    fn duplicate_event_updates_in_place() {
        let (mut engine, clock, _) = engine_at(at(8, 0));
        start_operation(&mut engine, &clock, 1);
        engine
            .record_event(RoomId(1), TimelineEventKind::Incision, "Dr. A", Some(at(9, 10)))
            .unwrap();
        let room = engine
            .record_event(RoomId(1), TimelineEventKind::Incision, "Dr. B", Some(at(9, 15)))
            .unwrap();
        assert_eq!(room.events.len(), 1);
        assert_eq!(room.events[0].time, at(9, 15));
        assert_eq!(room.events[0].user, "Dr. B");
        assert_eq!(room.status, RoomStatus::InProgress);
    }

    #[test]
    fn extend_only_while_in_progress() {
        let (mut engine, clock, _) = engine_at(at(8, 0));
        let err = engine.extend_operation(RoomId(1), 15).unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { status: RoomStatus::Free, .. }));

        start_operation(&mut engine, &clock, 1);
        let room = engine.extend_operation(RoomId(1), 15).unwrap();
        assert_eq!(room.operation_end_at, Some(at(11, 15)));

        clock.set(at(11, 10));
        engine.tick();
        assert_eq!(engine.room(RoomId(1)).unwrap().status, RoomStatus::InProgress);
        clock.set(at(11, 15));
        engine.tick();
        let room = engine.room(RoomId(1)).unwrap();
        assert_eq!(room.status, RoomStatus::Disinfection);
        assert_eq!(room.disinfection_start_at, Some(at(11, 15)));
    }

    #[test]
    fn finish_cleaning_early_frees_room() {
        let (mut engine, clock, _) = engine_at(at(8, 0));
        let err = engine.finish_cleaning_early(RoomId(1)).unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));

        start_operation(&mut engine, &clock, 1);
        engine
            .toggle_checklist_item(RoomId(1), &ChecklistItemId::from("c1"))
            .unwrap();
        engine
            .record_event(RoomId(1), TimelineEventKind::PatientExit, "Julie Martin", Some(at(10, 0)))
            .unwrap();
        let room = engine.finish_cleaning_early(RoomId(1)).unwrap();
        assert_eq!(room.status, RoomStatus::Free);
        assert!(room.events.is_empty());
        assert!(room.checklist.iter().all(|item| !item.checked));
        assert!(room.disinfection_end_at.is_none());
    }

    #[test]
    fn toggle_unknown_item_fails() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        let item = engine
            .toggle_checklist_item(RoomId(2), &ChecklistItemId::from("c3"))
            .unwrap();
        assert!(item.checked);
        let item = engine
            .toggle_checklist_item(RoomId(2), &ChecklistItemId::from("c3"))
            .unwrap();
        assert!(!item.checked);
        let err = engine
            .toggle_checklist_item(RoomId(2), &ChecklistItemId::from("zz"))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownItem { .. }));
    }

    #[test]
    fn profile_update_affects_future_windows_only() {
        let (mut engine, clock, _) = engine_at(at(8, 0));
        start_operation(&mut engine, &clock, 3);
        engine
            .record_event(RoomId(3), TimelineEventKind::PatientExit, "Julie Martin", Some(at(10, 0)))
            .unwrap();
        assert_eq!(
            engine.room(RoomId(3)).unwrap().disinfection_end_at,
            Some(at(10, 30))
        );

        let mut profile = default_hyper_septic_profile();
        profile.turnover_cleaning_min = 45;
        let room = engine.update_asepsis_profile(RoomId(3), profile).unwrap();
        assert_eq!(room.disinfection_end_at, Some(at(10, 30)));
        assert_eq!(cleaning_duration_for(&room, 20), 45);
    }

    #[test]
    fn profile_update_rejections() {
        let (mut engine, _, _) = engine_at(at(8, 0));
        let err = engine
            .update_asepsis_profile(RoomId(1), default_hyper_septic_profile())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProfile { .. }));

        let mut bad = default_hyper_septic_profile();
        bad.temp_c_min = 40.0;
        let err = engine.update_asepsis_profile(RoomId(3), bad).unwrap_err();
        assert!(matches!(err, EngineError::InvalidProfile { .. }));
    }

    #[test]
    fn noop_tick_writes_nothing() {
        let (mut engine, clock, slot) = engine_at(at(8, 0));
        let writes = slot.write_count();
        clock.advance(TimeDelta::seconds(1));
        let summary = engine.tick();
        assert!(summary.is_noop());
        assert!(!summary.persisted);
        assert_eq!(slot.write_count(), writes);
    }

    #[test]
    fn failed_write_is_retried_on_next_tick() {
        let (mut engine, clock, slot) = engine_at(at(8, 0));
        slot.set_available(false);
        engine
            .schedule_operation(RoomId(1), request(at(9, 0), at(10, 0)))
            .unwrap();
        assert!(engine.has_unsaved_changes());

        slot.set_available(true);
        clock.advance(TimeDelta::seconds(1));
        let summary = engine.tick();
        assert!(summary.persisted);
        assert!(!engine.has_unsaved_changes());
    }

    #[test]
    fn failing_room_does_not_block_others() {
        let clock = ManualClock::new(at(8, 0));
        let mut broken = Room::idle(RoomId(1), "Salle 1".to_owned(), RoomClass::Standard, None, vec![]);
        broken.status = RoomStatus::InProgress;
        broken.current_surgery_id = Some(OperationId::from("op-x"));
        let mut due = Room::idle(RoomId(2), "Salle 2".to_owned(), RoomClass::Standard, None, vec![]);
        due.schedule.push(Operation {
            id: OperationId::from("op-2"),
            patient_id: None,
            procedure_name: "Cataracte".to_owned(),
            surgeon: "Dr. Sarah Connor".to_owned(),
            room_id: RoomId(2),
            start: at(8, 0),
            end: at(9, 0),
            created_at: at(7, 0),
        });
        let bytes = serde_json::to_vec(&vec![broken, due]).unwrap();
        let slot = MemorySlot::with_record("surgiTrack_rooms", bytes);

        let (engine, startup) =
            TimeEngine::open(&config(), Box::new(slot), Arc::new(clock)).unwrap();
        assert_eq!(startup.catch_up.failures.len(), 1);
        assert_eq!(startup.catch_up.failures[0].room_id, RoomId(1));
        assert_eq!(engine.room(RoomId(2)).unwrap().status, RoomStatus::InProgress);
        assert_eq!(engine.room(RoomId(1)).unwrap().status, RoomStatus::InProgress);
    }
}
