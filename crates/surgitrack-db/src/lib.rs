//! Data layer for the SurgiTrack dashboard: one durable key-value slot.
//!
//! The whole room store is persisted as a single serialized record under a
//! fixed slot name. This crate provides the slot abstraction, its
//! implementations, and the snapshot codec that reads both the current
//! versioned layout and the bare room arrays written by older releases.
//!
//! ```text
//! RoomStore (surgitrack-core)
//!     |
//!     +-- encode / decode --> snapshot (RoomSnapshot <-> JSON bytes)
//!     |
//!     +-- load / store -----> SnapshotSlot
//!         |-- SledSlot    (on-disk sled tree, one key)
//!         +-- MemorySlot  (process memory; tests and ephemeral runs)
//! ```
//!
//! # Modules
//!
//! - [`slot`] -- The [`SnapshotSlot`] trait and the in-memory slot
//! - [`sled_slot`] -- `sled`-backed slot
//! - [`snapshot`] -- Snapshot layout and codec
//! - [`error`] -- Shared error types

pub mod error;
pub mod sled_slot;
pub mod slot;
pub mod snapshot;

// Re-export primary types for convenience.
pub use error::DbError;
pub use sled_slot::SledSlot;
pub use slot::{MemorySlot, SnapshotSlot};
pub use snapshot::{RejectedRoom, RoomSnapshot, SNAPSHOT_VERSION, load_snapshot, store_snapshot};
