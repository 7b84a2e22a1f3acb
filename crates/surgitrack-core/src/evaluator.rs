//! The room lifecycle state evaluator.
//!
//! [`evaluate`] is a pure function of a room and an instant. It applies the
//! first rule that fires, in priority order, and loops until none does:
//!
//! 1. **Auto-start**: an idle room whose queue holds an entry with
//!    `start <= now < end` starts that entry (earliest start wins).
//! 2. **Attention timeout**: `OPERATION_ENDED_ATTENTION` past its window
//!    moves to `DISINFECTION`, anchored at the window end.
//! 3. **Operation end**: `IN_PROGRESS` past its planned end moves to the
//!    attention window (when configured) or straight to `DISINFECTION`,
//!    anchored at the planned end.
//! 4. **Disinfection window**: a `DISINFECTION` room missing one or both
//!    window bounds gets them filled in.
//! 5. **Disinfection end**: `DISINFECTION` past its window returns to
//!    `FREE` with the episode data cleared.
//!
//! Boundaries are always anchored to the scheduled instant, never to `now`,
//! so one catch-up evaluation after a long suspension lands in exactly the
//! state that per-second ticks would have produced. The loop is bounded by
//! [`EvaluationPolicy::max_transitions`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use surgitrack_types::{OperationId, Room, RoomClass, RoomId, RoomStatus};
use ts_rs::TS;

use crate::config::SurgiTrackConfig;
use crate::schedule;

/// Per-room evaluation failures. Isolated to the room that raised them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// The room's status disagrees with its timestamps.
    #[error("room {room_id} is inconsistent in status {status}: {reason}")]
    InconsistentState {
        /// The room.
        room_id: RoomId,
        /// Its cached status.
        status: RoomStatus,
        /// Which field is missing or out of order.
        reason: String,
    },

    /// The fixed-point loop did not settle.
    #[error("room {room_id} did not settle within {limit} transitions")]
    TransitionLimit {
        /// The room.
        room_id: RoomId,
        /// The configured bound.
        limit: u32,
    },

    /// A computed boundary is not representable.
    #[error("time arithmetic overflow in room {room_id}")]
    TimeOverflow {
        /// The room.
        room_id: RoomId,
    },
}

/// Parameters the evaluator needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// Cleaning window of standard rooms, in minutes.
    pub default_cleaning_minutes: u32,
    /// Attention window length; `None` skips the attention phase.
    pub attention_minutes: Option<u32>,
    /// Upper bound on transitions in one evaluation.
    pub max_transitions: u32,
}

impl EvaluationPolicy {
    /// Policy described by `config`.
    pub const fn from_config(config: &SurgiTrackConfig) -> Self {
        Self {
            default_cleaning_minutes: config.disinfection.default_cleaning_minutes,
            attention_minutes: config.engine.attention_minutes,
            max_transitions: config.engine.max_transitions_per_evaluation,
        }
    }
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            default_cleaning_minutes: 20,
            attention_minutes: None,
            max_transitions: 16,
        }
    }
}

/// Which rule produced a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Rule {
    /// Queued operation started.
    AutoStart,
    /// Attention window elapsed.
    AttentionTimeout,
    /// Planned operation end reached.
    OperationEnd,
    /// Missing disinfection bounds filled in.
    DisinfectionWindow,
    /// Disinfection finished; room free.
    DisinfectionEnd,
}

/// One applied rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Transition {
    /// The room.
    pub room_id: RoomId,
    /// The rule that fired.
    pub rule: Rule,
    /// Status before.
    pub from: RoomStatus,
    /// Status after.
    pub to: RoomStatus,
    /// Instant the transition is anchored to.
    pub at: DateTime<Utc>,
    /// Operation involved, if any.
    pub operation_id: Option<OperationId>,
}

/// A changed room and the transitions that changed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The new room value.
    pub room: Room,
    /// Transitions in the order they were applied.
    pub transitions: Vec<Transition>,
}

/// Cleaning window of `room`, in minutes.
///
/// Hyper-septic rooms use their profile's turnover duration; everything
/// else (and a profile with a zero duration) uses `default_minutes`.
pub fn cleaning_duration_for(room: &Room, default_minutes: u32) -> u32 {
    match (room.room_class, &room.asepsis_profile) {
        (RoomClass::HyperSeptic, Some(profile)) if profile.turnover_cleaning_min > 0 => {
            profile.turnover_cleaning_min
        }
        _ => default_minutes,
    }
}

/// `at + minutes`, or `None` past the representable range.
pub fn plus_minutes(at: DateTime<Utc>, minutes: u32) -> Option<DateTime<Utc>> {
    TimeDelta::try_minutes(i64::from(minutes)).and_then(|delta| at.checked_add_signed(delta))
}

/// Evaluate `room` at `now` until no rule fires.
///
/// Returns `Ok(None)` when nothing changed. The returned room has passed
/// [`check_consistency`].
///
/// # Errors
///
/// Returns [`EvaluationError`] if the loop does not settle, a boundary
/// overflows, or the settled room is inconsistent.
pub fn evaluate(
    room: &Room,
    now: DateTime<Utc>,
    policy: &EvaluationPolicy,
) -> Result<Option<Evaluation>, EvaluationError> {
    let mut next = room.clone();
    let mut transitions = Vec::new();

    while let Some(transition) = step(&mut next, now, policy)? {
        transitions.push(transition);
        if transitions.len() > usize::try_from(policy.max_transitions).unwrap_or(usize::MAX) {
            return Err(EvaluationError::TransitionLimit {
                room_id: room.id,
                limit: policy.max_transitions,
            });
        }
    }

    check_consistency(&next)?;

    if transitions.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Evaluation {
            room: next,
            transitions,
        }))
    }
}

/// Apply the highest-priority rule that fires, if any.
fn step(
    room: &mut Room,
    now: DateTime<Utc>,
    policy: &EvaluationPolicy,
) -> Result<Option<Transition>, EvaluationError> {
    let from = room.status;
    let room_id = room.id;
    let overflow = move || EvaluationError::TimeOverflow { room_id };

    // 1. Auto-start from the queue.
    if from.is_idle() {
        if let Some(operation) = schedule::take_due(&mut room.schedule, now) {
            room.status = RoomStatus::InProgress;
            room.current_procedure = Some(operation.procedure_name);
            room.surgeon = Some(operation.surgeon);
            room.current_surgery_id = Some(operation.id.clone());
            room.operation_start_at = Some(operation.start);
            room.operation_end_at = Some(operation.end);
            room.legacy_end_time = None;
            return Ok(Some(transition(room, Rule::AutoStart, from, operation.start)));
        }
        return Ok(None);
    }

    match from {
        // 2. Attention window elapsed.
        RoomStatus::OperationEndedAttention => {
            let Some(attention_end) = room.attention_end_at else {
                return Ok(None);
            };
            if now < attention_end {
                return Ok(None);
            }
            let minutes = cleaning_duration_for(room, policy.default_cleaning_minutes);
            let cleaning_end = plus_minutes(attention_end, minutes).ok_or_else(overflow)?;
            room.status = RoomStatus::Disinfection;
            room.disinfection_start_at = Some(attention_end);
            room.disinfection_end_at = Some(cleaning_end);
            room.attention_start_at = None;
            room.attention_end_at = None;
            Ok(Some(transition(room, Rule::AttentionTimeout, from, attention_end)))
        }

        // 3. Planned operation end reached.
        RoomStatus::InProgress => {
            let Some(operation_end) = room.effective_operation_end() else {
                return Ok(None);
            };
            if now < operation_end {
                return Ok(None);
            }
            room.operation_end_at = Some(operation_end);
            room.legacy_end_time = None;
            if let Some(attention) = policy.attention_minutes {
                let attention_end = plus_minutes(operation_end, attention).ok_or_else(overflow)?;
                room.status = RoomStatus::OperationEndedAttention;
                room.attention_start_at = Some(operation_end);
                room.attention_end_at = Some(attention_end);
            } else {
                let minutes = cleaning_duration_for(room, policy.default_cleaning_minutes);
                let cleaning_end = plus_minutes(operation_end, minutes).ok_or_else(overflow)?;
                room.status = RoomStatus::Disinfection;
                room.disinfection_start_at = Some(operation_end);
                room.disinfection_end_at = Some(cleaning_end);
                room.attention_start_at = None;
                room.attention_end_at = None;
            }
            Ok(Some(transition(room, Rule::OperationEnd, from, operation_end)))
        }

        RoomStatus::Disinfection => {
            let minutes = cleaning_duration_for(room, policy.default_cleaning_minutes);
            match (room.disinfection_start_at, room.disinfection_end_at) {
                // 4. Window bounds missing.
                (None, None) => {
                    let cleaning_end = plus_minutes(now, minutes).ok_or_else(overflow)?;
                    room.disinfection_start_at = Some(now);
                    room.disinfection_end_at = Some(cleaning_end);
                    Ok(Some(transition(room, Rule::DisinfectionWindow, from, now)))
                }
                (Some(start), None) => {
                    let cleaning_end = plus_minutes(start, minutes).ok_or_else(overflow)?;
                    room.disinfection_end_at = Some(cleaning_end);
                    Ok(Some(transition(room, Rule::DisinfectionWindow, from, start)))
                }
                (None, Some(end)) => {
                    let delta = TimeDelta::try_minutes(i64::from(minutes)).ok_or_else(overflow)?;
                    let start = end.checked_sub_signed(delta).ok_or_else(overflow)?;
                    room.disinfection_start_at = Some(start);
                    Ok(Some(transition(room, Rule::DisinfectionWindow, from, start)))
                }
                // 5. Window elapsed.
                (Some(_), Some(end)) if now >= end => {
                    let operation_id = room.current_surgery_id.clone();
                    reset_to_free(room);
                    let mut applied = transition(room, Rule::DisinfectionEnd, from, end);
                    applied.operation_id = operation_id;
                    Ok(Some(applied))
                }
                (Some(_), Some(_)) => Ok(None),
            }
        }

        RoomStatus::Closing | RoomStatus::Free | RoomStatus::Scheduled => Ok(None),
    }
}

fn transition(room: &Room, rule: Rule, from: RoomStatus, at: DateTime<Utc>) -> Transition {
    Transition {
        room_id: room.id,
        rule,
        from,
        to: room.status,
        at,
        operation_id: room.current_surgery_id.clone(),
    }
}

/// Return `room` to `FREE`: clear the episode, uncheck the checklist,
/// drop the timeline. The queue is kept.
pub fn reset_to_free(room: &mut Room) {
    room.status = RoomStatus::Free;
    room.current_procedure = None;
    room.surgeon = None;
    room.current_surgery_id = None;
    room.operation_start_at = None;
    room.operation_end_at = None;
    room.disinfection_start_at = None;
    room.disinfection_end_at = None;
    room.attention_start_at = None;
    room.attention_end_at = None;
    room.legacy_end_time = None;
    room.events.clear();
    for item in &mut room.checklist {
        item.checked = false;
    }
}

/// Check that `room.status` agrees with its timestamps.
///
/// # Errors
///
/// Returns [`EvaluationError::InconsistentState`] naming the first
/// disagreement.
pub fn check_consistency(room: &Room) -> Result<(), EvaluationError> {
    let fail = |reason: &str| {
        Err(EvaluationError::InconsistentState {
            room_id: room.id,
            status: room.status,
            reason: reason.to_owned(),
        })
    };

    match room.status {
        RoomStatus::Free | RoomStatus::Scheduled => {
            if room.current_surgery_id.is_some()
                || room.operation_start_at.is_some()
                || room.operation_end_at.is_some()
            {
                return fail("idle room carries an operation");
            }
            if room.disinfection_start_at.is_some() || room.disinfection_end_at.is_some() {
                return fail("idle room carries a disinfection window");
            }
            if room.attention_start_at.is_some() || room.attention_end_at.is_some() {
                return fail("idle room carries an attention window");
            }
        }
        RoomStatus::InProgress | RoomStatus::Closing => {
            let (Some(start), Some(end)) = (room.operation_start_at, room.effective_operation_end())
            else {
                return fail("active operation without start and end");
            };
            if end < start {
                return fail("operation ends before it starts");
            }
        }
        RoomStatus::OperationEndedAttention => {
            let (Some(start), Some(end)) = (room.attention_start_at, room.attention_end_at) else {
                return fail("attention phase without a window");
            };
            if end < start {
                return fail("attention window ends before it starts");
            }
        }
        RoomStatus::Disinfection => {
            let (Some(start), Some(end)) = (room.disinfection_start_at, room.disinfection_end_at)
            else {
                return fail("disinfection without a window");
            };
            if end < start {
                return fail("disinfection window ends before it starts");
            }
        }
    }
    Ok(())
}
