//! Room snapshot layout and codec.
//!
//! Current releases write a versioned envelope:
//!
//! ```json
//! { "version": 1, "savedAt": "2026-03-02T09:00:00Z", "rooms": [ ... ] }
//! ```
//!
//! Older releases wrote the bare room array. Both decode to a
//! [`RoomSnapshot`]; a bare array gets version `0` and no save instant.
//!
//! Rooms are decoded one at a time. A room that does not decode is left
//! out and listed in [`RoomSnapshot::rejected`] instead of failing the
//! whole record. An unreadable `asepsisProfile` is dropped before the room
//! is given up on, since the fleet configuration supplies the profile
//! anyway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surgitrack_types::{Room, RoomId};
use tracing::{debug, warn};

use crate::error::DbError;
use crate::slot::SnapshotSlot;

/// Snapshot layout version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The whole room store at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Layout version (`0` for legacy bare arrays).
    pub version: u32,
    /// When the snapshot was written, if recorded.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// Every room of the fleet.
    pub rooms: Vec<Room>,
    /// Stored rooms that could not be decoded.
    #[serde(skip)]
    pub rejected: Vec<RejectedRoom>,
    /// Rooms decoded after dropping an unreadable asepsis profile.
    #[serde(skip)]
    pub profile_dropped: Vec<RoomId>,
}

/// A stored room entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRoom {
    /// The entry's `id`, when it is readable.
    pub id: Option<RoomId>,
    /// Why decoding failed.
    pub reason: String,
}

/// Envelope with the rooms still undecoded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    rooms: Vec<Value>,
}

impl RoomSnapshot {
    /// Snapshot of `rooms` taken at `saved_at`, in the current layout.
    pub const fn new(rooms: Vec<Room>, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Some(saved_at),
            rooms,
            rejected: Vec::new(),
            profile_dropped: Vec::new(),
        }
    }

    /// Serialize to the stored byte form.
    pub fn encode(&self) -> Result<Vec<u8>, DbError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a stored record in either layout.
    ///
    /// Fails only when the record as a whole is unusable; individual
    /// rooms that do not decode end up in [`Self::rejected`].
    pub fn decode(slot: &str, bytes: &[u8]) -> Result<Self, DbError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let (version, saved_at, entries) = match value {
            Value::Array(entries) => (0, None, entries),
            Value::Object(_) => {
                let envelope: RawEnvelope = serde_json::from_value(value)?;
                if envelope.version > SNAPSHOT_VERSION {
                    return Err(DbError::UnsupportedVersion {
                        found: envelope.version,
                        supported: SNAPSHOT_VERSION,
                    });
                }
                (envelope.version, envelope.saved_at, envelope.rooms)
            }
            other => {
                return Err(DbError::Corrupted {
                    slot: slot.to_owned(),
                    reason: format!("expected an object or an array, found {other}"),
                });
            }
        };

        let mut snapshot = Self {
            version,
            saved_at,
            rooms: Vec::with_capacity(entries.len()),
            rejected: Vec::new(),
            profile_dropped: Vec::new(),
        };
        for entry in entries {
            let id = entry_id(&entry);
            match decode_room(entry) {
                Ok((room, dropped_profile)) => {
                    if dropped_profile {
                        warn!(slot, room_id = %room.id, "Dropped unreadable asepsis profile");
                        snapshot.profile_dropped.push(room.id);
                    }
                    snapshot.rooms.push(room);
                }
                Err(e) => {
                    warn!(slot, room_id = ?id, error = %e, "Skipping unreadable stored room");
                    snapshot.rejected.push(RejectedRoom {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(snapshot)
    }
}

/// The `id` of a stored room entry, if it is a valid room number.
fn entry_id(entry: &Value) -> Option<RoomId> {
    entry
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .map(RoomId)
}

/// Decode one stored room. On failure, retry once without its asepsis
/// profile. Returns the room and whether the profile was dropped.
fn decode_room(mut entry: Value) -> Result<(Room, bool), serde_json::Error> {
    match Room::deserialize(&entry) {
        Ok(room) => Ok((room, false)),
        Err(e) => {
            let had_profile = entry
                .as_object_mut()
                .and_then(|fields| fields.remove("asepsisProfile"))
                .is_some_and(|profile| !profile.is_null());
            if !had_profile {
                return Err(e);
            }
            let room = Room::deserialize(&entry).map_err(|_retry| e)?;
            Ok((room, true))
        }
    }
}

/// Read and decode the slot's snapshot, if one was ever written.
pub fn load_snapshot(slot: &dyn SnapshotSlot) -> Result<Option<RoomSnapshot>, DbError> {
    let Some(bytes) = slot.load()? else {
        debug!(slot = slot.name(), "Snapshot slot is empty");
        return Ok(None);
    };
    RoomSnapshot::decode(slot.name(), &bytes).map(Some)
}

/// Encode and write `snapshot` to the slot.
pub fn store_snapshot(slot: &dyn SnapshotSlot, snapshot: &RoomSnapshot) -> Result<(), DbError> {
    let bytes = snapshot.encode()?;
    slot.store(&bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use surgitrack_types::{RoomClass, RoomId, RoomStatus};

    use super::*;

    #[test]
    fn bare_array_decodes_as_legacy_snapshot() {
        let bytes = br#"[{"id": 1, "name": "Salle 1", "status": "LIBRE", "events": [], "checklist": []}]"#;
        let snapshot = RoomSnapshot::decode("surgiTrack_rooms", bytes).unwrap();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.saved_at.is_none());
        assert_eq!(snapshot.rooms.len(), 1);
        assert_eq!(snapshot.rooms.first().unwrap().status, RoomStatus::Free);
    }

    #[test]
    fn envelope_keeps_save_instant() {
        let saved = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let room = Room::idle(RoomId(1), "Salle 1".to_owned(), RoomClass::Standard, None, vec![]);
        let bytes = RoomSnapshot::new(vec![room], saved).encode().unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"savedAt\":\"2026-03-02T09:00:00Z\""));

        let back = RoomSnapshot::decode("surgiTrack_rooms", &bytes).unwrap();
        assert_eq!(back.version, SNAPSHOT_VERSION);
        assert_eq!(back.saved_at, Some(saved));
    }

    #[test]
    fn newer_version_is_rejected() {
        let bytes = br#"{"version": 99, "rooms": []}"#;
        let err = RoomSnapshot::decode("surgiTrack_rooms", bytes).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn one_bad_room_does_not_discard_the_others() {
        let bytes = br#"[
            {"id": 1, "name": "Salle 1", "status": "LIBRE", "events": [], "checklist": [],
             "asepsisProfile": {"pressure_mode": "POSITIVE", "turnover_cleaning_min": "25"}},
            {"id": 2, "name": "Salle 2", "status": "EN COURS", "currentSurgeryId": "op-7",
             "operationStartAt": "2026-03-02T09:00:00Z", "operationEndAt": "2026-03-02T11:00:00Z",
             "events": [], "checklist": []},
            {"id": 3, "name": "Salle 3", "status": 17, "events": [], "checklist": []}
        ]"#;
        let snapshot = RoomSnapshot::decode("surgiTrack_rooms", bytes).unwrap();

        let ids: Vec<RoomId> = snapshot.rooms.iter().map(|room| room.id).collect();
        assert_eq!(ids, vec![RoomId(1), RoomId(2)]);
        assert_eq!(snapshot.profile_dropped, vec![RoomId(1)]);
        assert!(snapshot.rooms.first().unwrap().asepsis_profile.is_none());
        assert_eq!(snapshot.rooms.get(1).unwrap().status, RoomStatus::InProgress);

        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected.first().unwrap().id, Some(RoomId(3)));
    }

    #[test]
    fn scalar_record_is_corrupted() {
        let err = RoomSnapshot::decode("surgiTrack_rooms", b"42").unwrap_err();
        assert!(matches!(err, DbError::Corrupted { .. }));
    }
}
