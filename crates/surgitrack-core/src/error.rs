//! Errors returned by the time engine's imperative operations.
//!
//! All of them are local and recoverable: the caller shows them to the
//! operator and the tick loop carries on.

use chrono::{DateTime, Utc};
use surgitrack_types::{ChecklistItemId, OperationId, RoomId, RoomStatus};

use crate::evaluator::EvaluationError;

/// Errors from [`TimeEngine`](crate::engine::TimeEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A schedule request with a non-positive duration.
    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// The room id is not part of the fleet.
    #[error("unknown room {room_id}")]
    UnknownRoom {
        /// The requested room.
        room_id: RoomId,
    },

    /// The checklist item does not exist in the room's checklist.
    #[error("unknown checklist item {item_id} in room {room_id}")]
    UnknownItem {
        /// The room.
        room_id: RoomId,
        /// The requested item.
        item_id: ChecklistItemId,
    },

    /// The operation is not queued in the room.
    #[error("operation {operation_id} is not queued in room {room_id}")]
    UnknownOperation {
        /// The room.
        room_id: RoomId,
        /// The requested operation.
        operation_id: OperationId,
    },

    /// The room's queue already holds an operation with this id.
    #[error("operation {operation_id} is already queued in room {room_id}")]
    DuplicateOperation {
        /// The room.
        room_id: RoomId,
        /// The duplicated operation id.
        operation_id: OperationId,
    },

    /// A timeline event was recorded while no operation is running.
    #[error("room {room_id} has no active operation (status {status})")]
    NoActiveOperation {
        /// The room.
        room_id: RoomId,
        /// Its current status.
        status: RoomStatus,
    },

    /// A timeline event predates the start of the running operation.
    #[error("event at {at} precedes operation start {operation_start} in room {room_id}")]
    EventBeforeOperationStart {
        /// The room.
        room_id: RoomId,
        /// Requested event instant.
        at: DateTime<Utc>,
        /// Start of the running operation.
        operation_start: DateTime<Utc>,
    },

    /// The operation is not permitted in the room's current status.
    #[error("cannot {operation} room {room_id} while {status}")]
    IllegalTransition {
        /// The room.
        room_id: RoomId,
        /// Operation that was attempted.
        operation: &'static str,
        /// Status that forbids it.
        status: RoomStatus,
    },

    /// The asepsis profile failed validation or cannot be attached.
    #[error("invalid asepsis profile for room {room_id}: {reason}")]
    InvalidProfile {
        /// The room.
        room_id: RoomId,
        /// What is wrong.
        reason: String,
    },

    /// Timestamp arithmetic left the representable range.
    #[error("time arithmetic overflow")]
    TimeOverflow,

    /// The resulting room state failed its consistency check.
    #[error("evaluation error: {source}")]
    Evaluation {
        /// The underlying evaluation error.
        #[from]
        source: EvaluationError,
    },
}
