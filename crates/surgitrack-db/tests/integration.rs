//! Integration tests for the snapshot slots.
//!
//! Uses temporary `sled` databases, so no cleanup is needed.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use surgitrack_db::{MemorySlot, RoomSnapshot, SledSlot, SnapshotSlot, load_snapshot, store_snapshot};
use surgitrack_types::{Room, RoomClass, RoomId, RoomStatus};

fn sample_rooms() -> Vec<Room> {
    let mut busy = Room::idle(RoomId(2), "Salle 2".to_owned(), RoomClass::Standard, None, vec![]);
    busy.status = RoomStatus::InProgress;
    busy.operation_start_at = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    busy.operation_end_at = Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap());
    vec![
        Room::idle(RoomId(1), "Salle 1".to_owned(), RoomClass::Standard, None, vec![]),
        busy,
    ]
}

#[test]
fn sled_slot_round_trips_instants() {
    let slot = SledSlot::temporary("surgiTrack_rooms").unwrap();
    assert!(load_snapshot(&slot).unwrap().is_none());

    let saved = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
    let snapshot = RoomSnapshot::new(sample_rooms(), saved);
    store_snapshot(&slot, &snapshot).unwrap();

    let loaded = load_snapshot(&slot).unwrap().unwrap();
    assert_eq!(loaded, snapshot);
    let busy = loaded.rooms.get(1).unwrap();
    assert_eq!(
        busy.operation_end_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap())
    );
}

#[test]
fn sled_slot_overwrites_single_key() {
    let slot = SledSlot::temporary("surgiTrack_rooms").unwrap();
    slot.store(b"[]").unwrap();
    slot.store(b"[{\"id\": 1, \"name\": \"Salle 1\"}]").unwrap();
    let loaded = load_snapshot(&slot).unwrap().unwrap();
    assert_eq!(loaded.rooms.len(), 1);
}

#[test]
fn memory_slot_round_trip() {
    let slot = MemorySlot::new("surgiTrack_rooms");
    let saved = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
    store_snapshot(&slot, &RoomSnapshot::new(sample_rooms(), saved)).unwrap();
    assert_eq!(slot.write_count(), 1);
    let loaded = load_snapshot(&slot).unwrap().unwrap();
    assert_eq!(loaded.rooms.len(), 2);
}
