//! `sled`-backed snapshot slot.
//!
//! The database directory holds one tree with a single key (the slot name).
//! Every write is flushed before returning, so a snapshot acknowledged to
//! the room store survives a crash.

use std::path::Path;

use tracing::{debug, info};

use crate::error::DbError;
use crate::slot::SnapshotSlot;

/// Snapshot slot stored in a local `sled` database.
#[derive(Clone)]
pub struct SledSlot {
    db: sled::Db,
    key: String,
}

impl core::fmt::Debug for SledSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SledSlot").field("key", &self.key).finish_non_exhaustive()
    }
}

impl SledSlot {
    /// Open (or create) the database under `dir` and bind it to `key`.
    pub fn open(dir: impl AsRef<Path>, key: impl Into<String>) -> Result<Self, DbError> {
        let dir = dir.as_ref();
        let db = sled::Config::new().path(dir).open()?;
        let key = key.into();
        info!(path = %dir.display(), slot = %key, "Snapshot slot opened");
        Ok(Self { db, key })
    }

    /// Open a throwaway database that is removed when dropped.
    pub fn temporary(key: impl Into<String>) -> Result<Self, DbError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            key: key.into(),
        })
    }
}

impl SnapshotSlot for SledSlot {
    fn name(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Result<Option<Vec<u8>>, DbError> {
        let value = self.db.get(self.key.as_bytes())?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn store(&self, bytes: &[u8]) -> Result<(), DbError> {
        self.db.insert(self.key.as_bytes(), bytes)?;
        let flushed = self.db.flush()?;
        debug!(slot = %self.key, bytes = bytes.len(), flushed, "Snapshot written");
        Ok(())
    }
}
