//! The room store: the fleet's rooms plus the durable slot behind them.
//!
//! Rooms are held as `Arc<Room>` and replaced whole, never edited in place,
//! so a reader holding a room from an earlier snapshot never sees a partial
//! update. Writes to the slot happen only when something changed; a failed
//! write leaves the store dirty and the next [`RoomStore::persist`] retries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use surgitrack_db::{DbError, RoomSnapshot, SnapshotSlot, load_snapshot, store_snapshot};
use surgitrack_types::{Room, RoomId, RoomStatus};
use tracing::{debug, info, warn};

use crate::evaluator;
use crate::fleet::{FleetCatalog, RoomDefinition};
use crate::schedule;

/// Errors raised by the room store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The snapshot slot failed.
    #[error("snapshot slot error: {source}")]
    Db {
        /// The underlying data-layer error.
        #[from]
        source: DbError,
    },
}

/// What happened while loading the persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rooms restored from the snapshot.
    pub restored: usize,
    /// Fleet rooms absent from the snapshot, created fresh.
    pub created: Vec<RoomId>,
    /// Persisted rooms outside the fleet, discarded.
    pub dropped: Vec<RoomId>,
    /// Rooms whose persisted fields needed repair.
    pub repaired: Vec<RoomId>,
    /// Stored rooms that did not decode and were rebuilt from the fleet
    /// definition. Entries without a readable id are only counted in
    /// [`unreadable_rooms`](Self::unreadable_rooms).
    pub rejected: Vec<RoomId>,
    /// Stored room entries that did not decode.
    pub unreadable_rooms: usize,
    /// The snapshot used the bare-array layout of older releases.
    pub legacy_layout: bool,
    /// The slot held an unreadable record that was ignored.
    pub discarded_corrupt: bool,
}

/// Durable keyed collection of the fleet's rooms.
pub struct RoomStore {
    rooms: BTreeMap<RoomId, Arc<Room>>,
    slot: Box<dyn SnapshotSlot>,
    dirty: bool,
}

impl core::fmt::Debug for RoomStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoomStore")
            .field("rooms", &self.rooms.len())
            .field("slot", &self.slot.name())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl RoomStore {
    /// Load the slot's snapshot and normalize it against the catalog.
    ///
    /// Static definitions (name, class, profile) overwrite the persisted
    /// copies. Rooms missing from the snapshot are created idle; rooms not
    /// in the fleet are dropped. An unreadable record is logged and
    /// replaced by a fresh fleet. No evaluation happens here.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] if the slot cannot be read or holds a
    /// snapshot from a newer release.
    pub fn open(
        slot: Box<dyn SnapshotSlot>,
        catalog: &FleetCatalog,
        now: DateTime<Utc>,
    ) -> Result<(Self, LoadReport), StoreError> {
        let mut report = LoadReport::default();

        let persisted = match load_snapshot(slot.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(DbError::Serialization(e)) => {
                warn!(slot = slot.name(), error = %e, "Ignoring unreadable room snapshot");
                report.discarded_corrupt = true;
                None
            }
            Err(DbError::Corrupted { slot: name, reason }) => {
                warn!(slot = %name, reason = %reason, "Ignoring corrupted room snapshot");
                report.discarded_corrupt = true;
                None
            }
            Err(e) => return Err(e.into()),
        };

        let mut by_id: BTreeMap<RoomId, Room> = BTreeMap::new();
        if let Some(snapshot) = persisted {
            report.legacy_layout = snapshot.version == 0;
            report.unreadable_rooms = snapshot.rejected.len();
            report.rejected = snapshot.rejected.iter().filter_map(|entry| entry.id).collect();
            report.repaired.extend(snapshot.profile_dropped.iter().copied());
            for room in snapshot.rooms {
                if catalog.definition(room.id).is_some() {
                    by_id.insert(room.id, room);
                } else {
                    warn!(room_id = %room.id, "Dropping persisted room outside the fleet");
                    report.dropped.push(room.id);
                }
            }
        }

        let mut rooms = BTreeMap::new();
        for definition in catalog.definitions() {
            let room = if let Some(persisted) = by_id.remove(&definition.id) {
                report.restored = report.restored.saturating_add(1);
                let (room, repaired) = normalize(persisted, definition, catalog, now);
                if repaired && !report.repaired.contains(&definition.id) {
                    report.repaired.push(definition.id);
                }
                room
            } else {
                report.created.push(definition.id);
                catalog.new_room(definition)
            };
            rooms.insert(definition.id, Arc::new(room));
        }

        let dirty = report.legacy_layout
            || report.discarded_corrupt
            || report.unreadable_rooms > 0
            || !report.created.is_empty()
            || !report.dropped.is_empty()
            || !report.repaired.is_empty();

        info!(
            slot = slot.name(),
            restored = report.restored,
            created = report.created.len(),
            dropped = report.dropped.len(),
            repaired = report.repaired.len(),
            unreadable = report.unreadable_rooms,
            legacy_layout = report.legacy_layout,
            "Room store loaded"
        );

        Ok((Self { rooms, slot, dirty }, report))
    }

    /// The room with `id`.
    pub fn get(&self, id: RoomId) -> Option<Arc<Room>> {
        self.rooms.get(&id).cloned()
    }

    /// All rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Arc<Room>> {
        self.rooms.values()
    }

    /// A point-in-time copy of every room handle.
    pub fn snapshot(&self) -> Vec<Arc<Room>> {
        self.rooms.values().cloned().collect()
    }

    /// Replace a room wholesale and mark the store dirty.
    pub fn replace(&mut self, room: Room) -> Arc<Room> {
        let room = Arc::new(room);
        self.rooms.insert(room.id, Arc::clone(&room));
        self.dirty = true;
        room
    }

    /// Whether unsaved changes exist.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the snapshot if anything changed since the last successful
    /// write. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] if the write fails; the store stays dirty.
    pub fn persist(&mut self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if !self.dirty {
            return Ok(false);
        }
        let rooms = self.rooms.values().map(|room| Room::clone(room)).collect();
        store_snapshot(self.slot.as_ref(), &RoomSnapshot::new(rooms, now))?;
        self.dirty = false;
        debug!(slot = self.slot.name(), rooms = self.rooms.len(), "Room snapshot persisted");
        Ok(true)
    }
}

/// Bring a persisted room in line with its static definition and repair
/// fields older releases left behind. Returns the room and whether any
/// repair (beyond the static merge) was needed.
fn normalize(
    mut room: Room,
    definition: &RoomDefinition,
    catalog: &FleetCatalog,
    now: DateTime<Utc>,
) -> (Room, bool) {
    let mut repaired = false;

    room.name.clone_from(&definition.name);
    room.room_class = definition.class;
    room.asepsis_profile.clone_from(&definition.asepsis_profile);

    if room.status == RoomStatus::Scheduled {
        room.status = RoomStatus::Free;
        repaired = true;
    }

    if room.status.is_idle()
        && let Some(status) = phase_from_timestamps(&mut room, catalog.default_cleaning_minutes())
    {
        room.status = status;
        repaired = true;
    }

    if room.status.is_idle() {
        let stale = room.current_surgery_id.is_some()
            || room.operation_start_at.is_some()
            || room.operation_end_at.is_some()
            || room.legacy_end_time.is_some()
            || room.disinfection_start_at.is_some()
            || room.disinfection_end_at.is_some()
            || room.attention_start_at.is_some()
            || room.attention_end_at.is_some();
        if stale {
            room.current_procedure = None;
            room.surgeon = None;
            room.current_surgery_id = None;
            room.operation_start_at = None;
            room.operation_end_at = None;
            room.legacy_end_time = None;
            room.disinfection_start_at = None;
            room.disinfection_end_at = None;
            room.attention_start_at = None;
            room.attention_end_at = None;
            repaired = true;
        }
    }

    if room.status.has_active_operation() {
        if room.operation_end_at.is_none() && room.legacy_end_time.is_some() {
            room.operation_end_at = room.legacy_end_time.take();
            repaired = true;
        }
        if room.operation_start_at.is_none() {
            let earliest_event = room.events.iter().map(|event| event.time).min();
            let fallback = room.operation_end_at.map(|end| end.min(now));
            room.operation_start_at = earliest_event.or(fallback);
            repaired = true;
        }
    }

    if room.checklist.is_empty() {
        room.checklist = catalog.fresh_checklist();
        repaired = true;
    }

    if !room.schedule.is_sorted_by_key(|op| op.start) {
        schedule::sort(&mut room.schedule);
        repaired = true;
    }
    for entry in &mut room.schedule {
        entry.room_id = room.id;
    }

    (room, repaired)
}

/// The phase described by the timestamps of a room stored as idle, if
/// any. Older snapshots sometimes lost the status of a running phase while
/// keeping its window. A disinfection window missing one bound is
/// completed with the room's cleaning duration.
fn phase_from_timestamps(room: &mut Room, default_cleaning_minutes: u32) -> Option<RoomStatus> {
    if room.disinfection_start_at.is_some() || room.disinfection_end_at.is_some() {
        let minutes = evaluator::cleaning_duration_for(room, default_cleaning_minutes);
        match (room.disinfection_start_at, room.disinfection_end_at) {
            (Some(start), None) => {
                room.disinfection_end_at = evaluator::plus_minutes(start, minutes);
            }
            (None, Some(end)) => {
                room.disinfection_start_at =
                    end.checked_sub_signed(TimeDelta::minutes(i64::from(minutes)));
            }
            _ => {}
        }
        if let (Some(start), Some(end)) = (room.disinfection_start_at, room.disinfection_end_at)
            && start <= end
        {
            return Some(RoomStatus::Disinfection);
        }
    }
    if let (Some(start), Some(end)) = (room.attention_start_at, room.attention_end_at)
        && start <= end
    {
        return Some(RoomStatus::OperationEndedAttention);
    }
    if room.effective_operation_end().is_some() {
        return Some(RoomStatus::InProgress);
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use surgitrack_db::MemorySlot;
    use surgitrack_types::{OperationId, RoomClass};

    use super::*;
    use crate::config::SurgiTrackConfig;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn catalog(rooms: u32) -> FleetCatalog {
        let mut config = SurgiTrackConfig::default();
        config.fleet.room_count = rooms;
        config.fleet.hyper_septic_rooms = vec![1];
        FleetCatalog::from_config(&config)
    }

    #[test]
    fn empty_slot_creates_whole_fleet() {
        let slot = MemorySlot::new("surgiTrack_rooms");
        let (store, report) = RoomStore::open(Box::new(slot), &catalog(3), at(8, 0)).unwrap();
        assert_eq!(store.rooms().count(), 3);
        assert_eq!(report.created, vec![RoomId(1), RoomId(2), RoomId(3)]);
        assert!(store.is_dirty());
        assert_eq!(store.get(RoomId(1)).unwrap().room_class, RoomClass::HyperSeptic);
    }

    #[test]
    fn legacy_snapshot_is_normalized() {
        let legacy = serde_json::json!([
            {
                "id": 2,
                "name": "Old name",
                "status": "EN COURS",
                "currentProcedure": "Cataracte",
                "surgeon": "Dr. Sarah Connor",
                "currentSurgeryId": "op-105",
                "endTime": "2026-03-02T10:30:00.000Z",
                "events": [{"type": "Incision", "time": "2026-03-02T09:20:00.000Z", "user": "Dr. Sayegh"}],
                "checklist": []
            },
            {"id": 3, "name": "Salle 3", "status": "PROGRAMMÉ", "events": [], "checklist": []},
            {"id": 9, "name": "Salle 9", "status": "LIBRE", "events": [], "checklist": []}
        ]);
        let slot = MemorySlot::with_record("surgiTrack_rooms", serde_json::to_vec(&legacy).unwrap());

        let (store, report) = RoomStore::open(Box::new(slot), &catalog(3), at(9, 30)).unwrap();
        assert!(report.legacy_layout);
        assert_eq!(report.dropped, vec![RoomId(9)]);
        assert_eq!(report.created, vec![RoomId(1)]);

        let busy = store.get(RoomId(2)).unwrap();
        assert_eq!(busy.name, "Salle 2");
        assert_eq!(busy.status, RoomStatus::InProgress);
        assert_eq!(busy.operation_end_at, Some(at(10, 30)));
        assert_eq!(busy.operation_start_at, Some(at(9, 20)));
        assert!(busy.legacy_end_time.is_none());
        assert_eq!(busy.checklist.len(), 7);
        assert_eq!(busy.current_surgery_id, Some(OperationId::from("op-105")));

        let idle = store.get(RoomId(3)).unwrap();
        assert_eq!(idle.status, RoomStatus::Free);
    }

    #[test]
    fn unreadable_room_is_rebuilt_without_losing_its_neighbours() {
        let legacy = serde_json::json!([
            {
                "id": 1,
                "name": "Salle 1",
                "status": "LIBRE",
                "asepsisProfile": {"pressure_mode": "POSITIVE", "turnover_cleaning_min": "25"},
                "events": [],
                "checklist": []
            },
            {
                "id": 2,
                "name": "Salle 2",
                "status": "EN COURS",
                "currentProcedure": "Arthroscopie",
                "currentSurgeryId": "op-2",
                "operationStartAt": "2026-03-02T09:00:00.000Z",
                "operationEndAt": "2026-03-02T11:00:00.000Z",
                "events": [],
                "checklist": []
            },
            {"id": 3, "name": "Salle 3", "status": ["broken"], "events": [], "checklist": []}
        ]);
        let slot = MemorySlot::with_record("surgiTrack_rooms", serde_json::to_vec(&legacy).unwrap());

        let (store, report) = RoomStore::open(Box::new(slot), &catalog(3), at(10, 0)).unwrap();
        assert!(!report.discarded_corrupt);
        assert_eq!(report.rejected, vec![RoomId(3)]);
        assert_eq!(report.unreadable_rooms, 1);
        assert_eq!(report.created, vec![RoomId(3)]);
        assert!(report.repaired.contains(&RoomId(1)));

        let busy = store.get(RoomId(2)).unwrap();
        assert_eq!(busy.status, RoomStatus::InProgress);
        assert_eq!(busy.operation_end_at, Some(at(11, 0)));

        let hyper = store.get(RoomId(1)).unwrap();
        let configured = catalog(3).definition(RoomId(1)).unwrap().asepsis_profile.clone();
        assert!(configured.is_some());
        assert_eq!(hyper.asepsis_profile, configured);
        assert_eq!(store.get(RoomId(3)).unwrap().status, RoomStatus::Free);
    }

    #[test]
    fn status_lost_by_older_snapshots_is_derived_from_timestamps() {
        let legacy = serde_json::json!([
            {
                "id": 2,
                "name": "Salle 2",
                "disinfectionStartAt": "2026-03-02T09:50:00.000Z",
                "disinfectionEndAt": "2026-03-02T10:10:00.000Z",
                "events": [],
                "checklist": []
            },
            {
                "id": 3,
                "name": "Salle 3",
                "status": "LIBRE",
                "disinfectionEndAt": "2026-03-02T10:15:00.000Z",
                "events": [],
                "checklist": []
            }
        ]);
        let slot = MemorySlot::with_record("surgiTrack_rooms", serde_json::to_vec(&legacy).unwrap());

        let (store, report) = RoomStore::open(Box::new(slot), &catalog(3), at(10, 0)).unwrap();
        assert!(report.repaired.contains(&RoomId(2)));

        let cleaning = store.get(RoomId(2)).unwrap();
        assert_eq!(cleaning.status, RoomStatus::Disinfection);
        assert_eq!(cleaning.disinfection_start_at, Some(at(9, 50)));
        assert_eq!(cleaning.disinfection_end_at, Some(at(10, 10)));
        assert!(evaluator::check_consistency(&cleaning).is_ok());

        let completed = store.get(RoomId(3)).unwrap();
        assert_eq!(completed.status, RoomStatus::Disinfection);
        assert_eq!(completed.disinfection_start_at, Some(at(9, 55)));
        assert_eq!(completed.disinfection_end_at, Some(at(10, 15)));
    }

    #[test]
    fn idle_room_with_only_an_operation_id_is_cleared() {
        let legacy = serde_json::json!([
            {
                "id": 2,
                "name": "Salle 2",
                "status": "LIBRE",
                "currentSurgeryId": "op-9",
                "events": [],
                "checklist": []
            }
        ]);
        let slot = MemorySlot::with_record("surgiTrack_rooms", serde_json::to_vec(&legacy).unwrap());

        let (store, report) = RoomStore::open(Box::new(slot), &catalog(3), at(10, 0)).unwrap();
        assert!(report.repaired.contains(&RoomId(2)));
        let room = store.get(RoomId(2)).unwrap();
        assert_eq!(room.status, RoomStatus::Free);
        assert!(room.current_surgery_id.is_none());
    }

    #[test]
    fn corrupted_record_starts_fresh() {
        let slot = MemorySlot::with_record("surgiTrack_rooms", b"{not json".to_vec());
        let (store, report) = RoomStore::open(Box::new(slot), &catalog(2), at(8, 0)).unwrap();
        assert!(report.discarded_corrupt);
        assert_eq!(store.rooms().count(), 2);
    }

    #[test]
    fn newer_snapshot_is_refused() {
        let slot = MemorySlot::with_record("surgiTrack_rooms", br#"{"version": 7, "rooms": []}"#.to_vec());
        let err = RoomStore::open(Box::new(slot), &catalog(2), at(8, 0)).unwrap_err();
        assert!(matches!(err, StoreError::Db { source: DbError::UnsupportedVersion { .. } }));
    }

    #[test]
    fn persist_only_when_dirty_and_retries_after_failure() {
        let slot = MemorySlot::new("surgiTrack_rooms");
        let probe = slot.clone();
        let (mut store, _) = RoomStore::open(Box::new(slot), &catalog(2), at(8, 0)).unwrap();

        assert!(store.persist(at(8, 0)).unwrap());
        assert_eq!(probe.write_count(), 1);
        assert!(!store.persist(at(8, 1)).unwrap());
        assert_eq!(probe.write_count(), 1);

        let mut room = Room::clone(&store.get(RoomId(2)).unwrap());
        room.surgeon = None;
        store.replace(room);

        probe.set_available(false);
        assert!(store.persist(at(8, 2)).is_err());
        assert!(store.is_dirty());

        probe.set_available(true);
        assert!(store.persist(at(8, 3)).unwrap());
        assert!(!store.is_dirty());
        assert_eq!(probe.write_count(), 2);
    }

    #[test]
    fn replaced_room_does_not_affect_held_handle() {
        let slot = MemorySlot::new("surgiTrack_rooms");
        let (mut store, _) = RoomStore::open(Box::new(slot), &catalog(2), at(8, 0)).unwrap();
        let held = store.get(RoomId(2)).unwrap();

        let mut changed = Room::clone(&held);
        changed.status = RoomStatus::Disinfection;
        changed.disinfection_start_at = Some(at(8, 0));
        changed.disinfection_end_at = Some(at(8, 20));
        store.replace(changed);

        assert_eq!(held.status, RoomStatus::Free);
        assert_eq!(store.get(RoomId(2)).unwrap().status, RoomStatus::Disinfection);
    }
}
