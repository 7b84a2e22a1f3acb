//! Strongly-typed identifiers.
//!
//! Rooms are numbered `1..=N` by the fleet configuration and keep that
//! number for their whole life, so [`RoomId`] wraps a plain integer.
//! Operations, checklist items and staff members use string identifiers
//! because earlier snapshots stored hand-written ids (`op-101`, `c1`,
//! `s1`) that must still load.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable identifier of an operating room (`1..=room_count`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct RoomId(pub u32);

impl RoomId {
    /// Return the raw room number.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RoomId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_string_id! {
    /// Identifier of a scheduled or active surgical operation.
    OperationId
}

define_string_id! {
    /// Identifier of a safety checklist item within a room's checklist.
    ChecklistItemId
}

define_string_id! {
    /// Identifier of a staff member in the static directory.
    StaffId
}

impl OperationId {
    /// Create a fresh operation identifier (`op-` followed by a UUID v7).
    ///
    /// UUID v7 is time-ordered, so ids generated later sort later.
    pub fn generate() -> Self {
        Self(format!("op-{}", Uuid::now_v7().simple()))
    }
}
