//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sled`] and [`serde_json`] errors with the slot they concern.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `sled` operation failed.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored record is not a room snapshot in any known layout.
    #[error("slot {slot} holds a corrupted snapshot: {reason}")]
    Corrupted {
        /// Slot name.
        slot: String,
        /// What was wrong with the record.
        reason: String,
    },

    /// The snapshot was written by a newer release.
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the record.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// The slot is not accepting writes.
    #[error("slot {slot} is unavailable")]
    Unavailable {
        /// Slot name.
        slot: String,
    },

    /// An in-memory slot lock was poisoned by a panicking writer.
    #[error("slot lock poisoned: {0}")]
    Poisoned(String),
}
