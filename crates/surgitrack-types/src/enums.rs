//! Enumeration types for the SurgiTrack dashboard.
//!
//! Every enum serializes in `SCREAMING_SNAKE_CASE`. Earlier snapshots
//! stored French display labels (`LIBRE`, `EN COURS`, `NETTOYAGE`, ...);
//! those are accepted as deserialization aliases so old data still loads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of an operating room.
///
/// The machine cycles indefinitely:
/// `FREE -> IN_PROGRESS -> (CLOSING) -> (OPERATION_ENDED_ATTENTION) -> DISINFECTION -> FREE`.
/// `SCHEDULED` is an idle state carried over from older snapshots and is
/// treated exactly like `FREE` by the evaluator.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RoomStatus {
    /// No operation, no cleaning in progress.
    #[default]
    #[serde(alias = "LIBRE")]
    Free,
    /// Idle, waiting for a queued operation.
    #[serde(alias = "PROGRAMMÉ")]
    Scheduled,
    /// Surgical phase running.
    #[serde(alias = "EN COURS")]
    InProgress,
    /// Closure recorded; waiting for the patient to leave the room.
    #[serde(alias = "SUTURE / FERMETURE")]
    Closing,
    /// Operation ended; transitional window before disinfection.
    OperationEndedAttention,
    /// Turnover cleaning running.
    #[serde(alias = "CLEANING", alias = "NETTOYAGE")]
    Disinfection,
}

impl RoomStatus {
    /// Whether the room is idle (no operation, no cleaning).
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Free | Self::Scheduled)
    }

    /// Whether an operation episode is active (events may be recorded).
    pub const fn has_active_operation(self) -> bool {
        matches!(self, Self::InProgress | Self::Closing)
    }

    /// Whether the room is occupied by a patient or surgical team.
    pub const fn is_surgical(self) -> bool {
        matches!(
            self,
            Self::InProgress | Self::Closing | Self::OperationEndedAttention
        )
    }

    /// Stable upper-case name, identical to the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Scheduled => "SCHEDULED",
            Self::InProgress => "IN_PROGRESS",
            Self::Closing => "CLOSING",
            Self::OperationEndedAttention => "OPERATION_ENDED_ATTENTION",
            Self::Disinfection => "DISINFECTION",
        }
    }
}

impl core::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of an operating room, fixed per id by configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RoomClass {
    /// Regular operating room.
    #[default]
    #[serde(alias = "standard")]
    Standard,
    /// Room with stricter air handling and longer cleaning protocols.
    #[serde(alias = "hyper_septic", alias = "HYPER_SEPTIQUE")]
    HyperSeptic,
}

// ---------------------------------------------------------------------------
// Intraoperative timeline
// ---------------------------------------------------------------------------

/// Surgical milestone recorded on a room's timeline.
///
/// Variants are declared in their natural order within an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum TimelineEventKind {
    /// Patient enters the operating room.
    #[serde(alias = "Entrée Patient")]
    PatientEntry,
    /// Anesthesia induction.
    #[serde(alias = "Induction Anesthésique")]
    AnesthesiaInduction,
    /// First incision.
    #[serde(alias = "Incision")]
    Incision,
    /// Key surgical gesture.
    #[serde(alias = "Geste Opératoire Clé")]
    KeyGesture,
    /// Closure begins. Moves the room to `CLOSING`.
    #[serde(alias = "Fermeture")]
    Closure,
    /// Patient leaves the room. Ends the operation and starts disinfection.
    #[serde(alias = "Sortie de Salle")]
    PatientExit,
}

impl TimelineEventKind {
    /// All milestones in timeline order.
    pub const ALL: [Self; 6] = [
        Self::PatientEntry,
        Self::AnesthesiaInduction,
        Self::Incision,
        Self::KeyGesture,
        Self::Closure,
        Self::PatientExit,
    ];

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PatientEntry => "Patient entry",
            Self::AnesthesiaInduction => "Anesthesia induction",
            Self::Incision => "Incision",
            Self::KeyGesture => "Key surgical gesture",
            Self::Closure => "Closure",
            Self::PatientExit => "Patient exit",
        }
    }
}

// ---------------------------------------------------------------------------
// Safety checklist
// ---------------------------------------------------------------------------

/// Phase of the surgical safety checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ChecklistPhase {
    /// Sign-in, before anesthesia induction.
    BeforeInduction,
    /// Time-out, before skin incision.
    BeforeIncision,
    /// Sign-out, before the patient leaves the room.
    BeforeExit,
}

// ---------------------------------------------------------------------------
// Staff and air handling
// ---------------------------------------------------------------------------

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum StaffRole {
    /// Operating surgeon.
    Surgeon,
    /// Anesthesiologist.
    Anesthesiologist,
    /// Operating-room nurse (IBODE).
    #[serde(alias = "IBODE")]
    ScrubNurse,
    /// Nurse anesthetist (IADE).
    #[serde(alias = "IADE")]
    NurseAnesthetist,
}

/// Room pressurization mode relative to adjacent areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum PressureMode {
    /// Overpressure; air flows out of the room.
    Positive,
    /// Underpressure; air flows into the room.
    Negative,
}
