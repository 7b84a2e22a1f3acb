//! Shared type definitions for the SurgiTrack operating-room dashboard.
//!
//! This crate is the single source of truth for the room, operation and
//! timeline types used across the SurgiTrack workspace. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for the dashboard frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers (rooms, operations, checklist items, staff)
//! - [`enums`] -- Enumeration types (room status, room class, milestones)
//! - [`structs`] -- Core entity structs (rooms, operations, profiles, staff)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ChecklistPhase, PressureMode, RoomClass, RoomStatus, StaffRole, TimelineEventKind,
};
pub use ids::{ChecklistItemId, OperationId, RoomId, StaffId};
pub use structs::{
    Advice, AsepsisProfile, ChecklistItem, Operation, Room, StaffMember, TimelineEvent,
};
