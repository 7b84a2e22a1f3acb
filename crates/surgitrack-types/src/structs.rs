//! Core entity structs: rooms, operations, timeline events, checklist items,
//! asepsis profiles and staff.
//!
//! Persisted field names are `camelCase` (the layout of the stored room
//! snapshot). Every instant is a [`DateTime<Utc>`] and serializes as an
//! ISO-8601 timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    ChecklistPhase, PressureMode, RoomClass, RoomStatus, StaffRole, TimelineEventKind,
};
use crate::ids::{ChecklistItemId, OperationId, RoomId, StaffId};

// ---------------------------------------------------------------------------
// Asepsis profile
// ---------------------------------------------------------------------------

/// Air-handling and cleaning parameters of a hyper-septic room.
///
/// Only [`turnover_cleaning_min`](Self::turnover_cleaning_min) affects the
/// lifecycle (it is the disinfection window length); the rest is display
/// data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AsepsisProfile {
    /// Pressurization mode.
    pub pressure_mode: PressureMode,
    /// Target pressure differential in pascals.
    pub pressure_pa_target: i32,
    /// Air renewals per hour.
    pub air_changes_per_hour: u32,
    /// HEPA filter class (`H13`, `H14`, `U15`).
    pub hepa_filter: String,
    /// Airflow pattern (e.g. vertical laminar).
    pub airflow: String,
    /// Airflow velocity in metres per second.
    pub air_velocity_mps: f64,
    /// Lower temperature bound in degrees Celsius.
    pub temp_c_min: f64,
    /// Upper temperature bound in degrees Celsius.
    pub temp_c_max: f64,
    /// Lower relative humidity bound in percent.
    pub humidity_pct_min: f64,
    /// Upper relative humidity bound in percent.
    pub humidity_pct_max: f64,
    /// Standard turnover cleaning duration in minutes.
    pub turnover_cleaning_min: u32,
    /// End-of-day terminal cleaning duration in minutes.
    pub terminal_cleaning_min: u32,
    /// Recommended maximum number of people in the room.
    pub max_people_recommended: u32,
}

// ---------------------------------------------------------------------------
// Checklist and timeline
// ---------------------------------------------------------------------------

/// One item of the surgical safety checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChecklistItem {
    /// Item identifier, unique within a checklist.
    pub id: ChecklistItemId,
    /// Text shown to the operator.
    pub label: String,
    /// Whether the item has been confirmed.
    pub checked: bool,
    /// Checklist phase the item belongs to.
    pub phase: ChecklistPhase,
}

/// A milestone recorded during an operation episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineEvent {
    /// Which milestone this is.
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    /// When the milestone happened.
    pub time: DateTime<Utc>,
    /// Who recorded it (free text).
    pub user: String,
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A scheduled surgical operation (a schedule queue entry).
///
/// Entries are immutable once queued. They are removed from the queue when
/// the evaluator starts them; extending a running operation changes the
/// room's `operation_end_at`, never the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Operation {
    /// Operation identifier.
    pub id: OperationId,
    /// Patient reference, when known.
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Procedure name.
    #[serde(alias = "procedure")]
    pub procedure_name: String,
    /// Operating surgeon (display name).
    pub surgeon: String,
    /// Room the operation is booked in.
    #[serde(default)]
    pub room_id: RoomId,
    /// Planned start (inclusive).
    pub start: DateTime<Utc>,
    /// Planned end (exclusive).
    pub end: DateTime<Utc>,
    /// When the entry was created.
    #[serde(default, alias = "created")]
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// Whether `now` lies within `[start, end)`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// Whether the window already closed at `now` without the entry being
    /// started.
    pub fn is_missed(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// An operating room and everything the dashboard tracks about it.
///
/// `status` is a cached value: the time engine only changes it together
/// with the timestamps that justify it, and checks the pair for consistency
/// on every commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Room {
    /// Room number.
    pub id: RoomId,
    /// Display label, derived from id and class.
    pub name: String,
    /// Room class, fixed by configuration.
    #[serde(default, alias = "type")]
    pub room_class: RoomClass,
    /// Asepsis profile (hyper-septic rooms only).
    #[serde(default)]
    pub asepsis_profile: Option<AsepsisProfile>,
    /// Cached lifecycle state.
    #[serde(default)]
    pub status: RoomStatus,
    /// Procedure of the active or just-ended operation.
    #[serde(default)]
    pub current_procedure: Option<String>,
    /// Surgeon of the active or just-ended operation.
    #[serde(default)]
    pub surgeon: Option<String>,
    /// Identifier of the active or just-ended operation.
    #[serde(default)]
    pub current_surgery_id: Option<OperationId>,
    /// Start of the surgical phase.
    #[serde(default)]
    pub operation_start_at: Option<DateTime<Utc>>,
    /// Planned (or actual, once ended) end of the surgical phase.
    #[serde(default)]
    pub operation_end_at: Option<DateTime<Utc>>,
    /// Start of the disinfection window.
    #[serde(default)]
    pub disinfection_start_at: Option<DateTime<Utc>>,
    /// End of the disinfection window.
    #[serde(default)]
    pub disinfection_end_at: Option<DateTime<Utc>>,
    /// Start of the post-operation attention window.
    #[serde(default)]
    pub attention_start_at: Option<DateTime<Utc>>,
    /// End of the post-operation attention window.
    #[serde(default)]
    pub attention_end_at: Option<DateTime<Utc>>,
    /// Operation end written by older snapshots. Read as a fallback for
    /// `operation_end_at`, never written by the engine.
    #[serde(
        default,
        rename = "endTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_end_time: Option<DateTime<Utc>>,
    /// Milestones of the current operation episode, in recording order.
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    /// Safety checklist of the current episode.
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    /// Pending operations, ascending by start.
    #[serde(default)]
    pub schedule: Vec<Operation>,
}

impl Room {
    /// Create an idle room with the given static definition and checklist.
    pub fn idle(
        id: RoomId,
        name: String,
        room_class: RoomClass,
        asepsis_profile: Option<AsepsisProfile>,
        checklist: Vec<ChecklistItem>,
    ) -> Self {
        Self {
            id,
            name,
            room_class,
            asepsis_profile,
            status: RoomStatus::Free,
            current_procedure: None,
            surgeon: None,
            current_surgery_id: None,
            operation_start_at: None,
            operation_end_at: None,
            disinfection_start_at: None,
            disinfection_end_at: None,
            attention_start_at: None,
            attention_end_at: None,
            legacy_end_time: None,
            events: Vec::new(),
            checklist,
            schedule: Vec::new(),
        }
    }

    /// The operation end used by the lifecycle: `operation_end_at`, or the
    /// legacy `endTime` when only that one is present.
    pub fn effective_operation_end(&self) -> Option<DateTime<Utc>> {
        self.operation_end_at.or(self.legacy_end_time)
    }

    /// The recorded event of the given kind, if any.
    pub fn event(&self, kind: TimelineEventKind) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.kind == kind)
    }

    /// Number of checked checklist items.
    pub fn checked_items(&self) -> usize {
        self.checklist.iter().filter(|item| item.checked).count()
    }

    /// The first queued operation that has not finished by `now`.
    pub fn next_operation(&self, now: DateTime<Utc>) -> Option<&Operation> {
        self.schedule.iter().find(|op| op.end > now)
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// A member of the static staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StaffMember {
    /// Directory identifier.
    pub id: StaffId,
    /// Display name.
    pub name: String,
    /// Role in the operating team.
    pub role: StaffRole,
    /// Surgical specialty, for surgeons.
    #[serde(default)]
    pub specialty: Option<String>,
}

// ---------------------------------------------------------------------------
// Advisory
// ---------------------------------------------------------------------------

/// Structured answer of the optimization advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Advice {
    /// Free-text analysis of the current block situation.
    pub analysis: String,
    /// Actionable recommendations.
    #[serde(default)]
    pub recommendations: Vec<String>,
}
