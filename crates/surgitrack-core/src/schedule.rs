//! Per-room schedule queue.
//!
//! The queue is a `Vec<Operation>` on the room, kept sorted ascending by
//! start. Ties keep insertion order. Entries leave the queue when the
//! evaluator starts them or an operator cancels them; entries whose window
//! passed unstarted stay queued and show as missed on the calendar.

use chrono::{DateTime, Utc};
use surgitrack_types::{Operation, OperationId, RoomId};

use crate::error::EngineError;

/// Insert `operation` keeping the queue ordered. Returns its position.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInterval`] if `end <= start`, or
/// [`EngineError::DuplicateOperation`] if the id is already queued.
pub fn insert(
    queue: &mut Vec<Operation>,
    room_id: RoomId,
    operation: Operation,
) -> Result<usize, EngineError> {
    if operation.end <= operation.start {
        return Err(EngineError::InvalidInterval {
            start: operation.start,
            end: operation.end,
        });
    }
    if queue.iter().any(|queued| queued.id == operation.id) {
        return Err(EngineError::DuplicateOperation {
            room_id,
            operation_id: operation.id,
        });
    }
    let position = queue.partition_point(|queued| queued.start <= operation.start);
    queue.insert(position, operation);
    Ok(position)
}

/// Remove the entry with `operation_id`.
///
/// # Errors
///
/// Returns [`EngineError::UnknownOperation`] if it is not queued.
pub fn remove(
    queue: &mut Vec<Operation>,
    room_id: RoomId,
    operation_id: &OperationId,
) -> Result<Operation, EngineError> {
    let position = queue
        .iter()
        .position(|queued| &queued.id == operation_id)
        .ok_or_else(|| EngineError::UnknownOperation {
            room_id,
            operation_id: operation_id.clone(),
        })?;
    Ok(queue.remove(position))
}

/// Pop the earliest entry whose window contains `now`.
pub fn take_due(queue: &mut Vec<Operation>, now: DateTime<Utc>) -> Option<Operation> {
    let position = queue.iter().position(|queued| queued.is_due(now))?;
    Some(queue.remove(position))
}

/// Restore ascending start order (for queues loaded from older snapshots).
pub fn sort(queue: &mut [Operation]) {
    queue.sort_by_key(|queued| queued.start);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn op(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Operation {
        Operation {
            id: OperationId::from(id),
            patient_id: Some("PT-1".to_owned()),
            procedure_name: "Craniotomie".to_owned(),
            surgeon: "Dr. Marie Curie".to_owned(),
            room_id: RoomId(1),
            start,
            end,
            created_at: at(7, 0),
        }
    }

    #[test]
    fn insert_keeps_start_order() {
        let mut queue = Vec::new();
        insert(&mut queue, RoomId(1), op("b", at(13, 0), at(14, 0))).unwrap();
        insert(&mut queue, RoomId(1), op("a", at(9, 0), at(10, 0))).unwrap();
        let pos = insert(&mut queue, RoomId(1), op("c", at(11, 0), at(12, 0))).unwrap();
        assert_eq!(pos, 1);
        let ids: Vec<&str> = queue.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn equal_starts_keep_insertion_order() {
        let mut queue = Vec::new();
        insert(&mut queue, RoomId(1), op("first", at(9, 0), at(10, 0))).unwrap();
        insert(&mut queue, RoomId(1), op("second", at(9, 0), at(9, 30))).unwrap();
        assert_eq!(queue[0].id.as_str(), "first");
    }

    #[test]
    fn empty_or_inverted_interval_is_rejected() {
        let mut queue = Vec::new();
        let err = insert(&mut queue, RoomId(1), op("a", at(9, 0), at(9, 0))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInterval { .. }));
        let err = insert(&mut queue, RoomId(1), op("a", at(10, 0), at(9, 0))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInterval { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut queue = Vec::new();
        insert(&mut queue, RoomId(1), op("a", at(9, 0), at(10, 0))).unwrap();
        let err = insert(&mut queue, RoomId(1), op("a", at(11, 0), at(12, 0))).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateOperation { .. }));
    }

    #[test]
    fn remove_unknown_is_an_error() {
        let mut queue = vec![op("a", at(9, 0), at(10, 0))];
        let err = remove(&mut queue, RoomId(1), &OperationId::from("zz")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownOperation { .. }));
        assert_eq!(remove(&mut queue, RoomId(1), &OperationId::from("a")).unwrap().id.as_str(), "a");
        assert!(queue.is_empty());
    }

    #[test]
    fn take_due_skips_missed_and_future() {
        let mut queue = vec![
            op("missed", at(7, 0), at(8, 0)),
            op("due", at(8, 30), at(10, 0)),
            op("later", at(11, 0), at(12, 0)),
        ];
        assert_eq!(queue.iter().filter(|o| o.is_missed(at(9, 0))).count(), 1);
        let due = take_due(&mut queue, at(9, 0)).unwrap();
        assert_eq!(due.id.as_str(), "due");
        assert_eq!(queue.len(), 2);
        assert!(take_due(&mut queue, at(9, 0)).is_none());
    }

    #[test]
    fn sort_restores_order() {
        let mut queue = vec![op("b", at(13, 0), at(14, 0)), op("a", at(9, 0), at(10, 0))];
        sort(&mut queue);
        assert_eq!(queue[0].id.as_str(), "a");
    }
}
