//! Durable storage for the lock record.
//!
//! The record lives in a single JSON file (default `.chm_lock.json` in the
//! state directory). Writes go through [`crate::fs::atomic_write`] so readers
//! never see a partial record. Mutating commands additionally hold a
//! [`StoreGuard`] so two processes cannot interleave load-mutate-save.

mod guard;

pub use guard::{GuardMetadata, StoreGuard, acquire_store_guard};

use crate::error::{ChmError, Result};
use crate::lock::LockRecord;
use std::path::{Path, PathBuf};

/// Read/write access to the persisted lock record.
pub trait LockStore {
    /// Load the record, or `None` if nothing has been persisted yet.
    fn load(&self) -> Result<Option<LockRecord>>;

    /// Replace the persisted record.
    fn save(&self, record: &LockRecord) -> Result<()>;
}

/// Stores the lock record as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockStore for JsonFileStore {
    fn load(&self) -> Result<Option<LockRecord>> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ChmError::Io(format!(
                "failed to read lock file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        LockRecord::from_json(&content)
            .map(Some)
            .map_err(|e| match e {
                ChmError::CorruptState(msg) => {
                    ChmError::CorruptState(format!("{} ({})", msg, self.path.display()))
                }
                other => other,
            })
    }

    fn save(&self, record: &LockRecord) -> Result<()> {
        let json = record.to_json()?;
        crate::fs::atomic_write_file(&self.path, &json)
    }
}
