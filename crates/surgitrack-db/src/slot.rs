//! The durable key-value slot abstraction.
//!
//! A [`SnapshotSlot`] holds at most one opaque record. Reads and writes are
//! synchronous: the room store persists from inside the single-writer
//! critical section and never yields mid-write.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::DbError;

/// A single named storage slot holding the latest room snapshot.
pub trait SnapshotSlot: Send + Sync {
    /// Name of the slot, used in logs and errors.
    fn name(&self) -> &str;

    /// Read the stored record, or `None` if nothing was ever written.
    fn load(&self) -> Result<Option<Vec<u8>>, DbError>;

    /// Replace the stored record and make it durable.
    fn store(&self, bytes: &[u8]) -> Result<(), DbError>;
}

/// Slot kept in process memory.
///
/// Clones share the same record, so a test can hand one clone to the room
/// store and inspect the other. Writes can be switched off with
/// [`set_available`](Self::set_available) to simulate storage outages.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    name: String,
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    record: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemorySlot {
    /// Create an empty in-memory slot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(MemoryInner::default()),
        }
    }

    /// Create an in-memory slot pre-filled with a record.
    pub fn with_record(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let slot = Self::new(name);
        if let Ok(mut record) = slot.inner.record.lock() {
            *record = Some(bytes);
        }
        slot
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes succeed (`true`) or fail (`false`).
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Copy of the current record.
    pub fn record(&self) -> Result<Option<Vec<u8>>, DbError> {
        self.load()
    }
}

impl SnapshotSlot for MemorySlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<Vec<u8>>, DbError> {
        let record = self
            .inner
            .record
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        Ok(record.clone())
    }

    fn store(&self, bytes: &[u8]) -> Result<(), DbError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable {
                slot: self.name.clone(),
            });
        }
        let mut record = self
            .inner
            .record
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        *record = Some(bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
