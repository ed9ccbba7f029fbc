//! The persisted lock record and its JSON form.

use super::types::{HistoryEntry, LockKind, Owner, Waiter};
use crate::error::{ChmError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete lock state for the chassis.
///
/// Serialized as a JSON object with the keys `Type`, `Owners`, `Waiters`
/// and `History`. Every key is required when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LockRecord {
    #[serde(rename = "Type")]
    pub kind: LockKind,
    pub owners: Vec<Owner>,
    pub waiters: Vec<Waiter>,
    pub history: Vec<HistoryEntry>,
}

impl Default for LockRecord {
    fn default() -> Self {
        Self {
            kind: LockKind::Free,
            owners: Vec::new(),
            waiters: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl LockRecord {
    /// Parse and check a record read from storage.
    pub fn from_json(content: &str) -> Result<Self> {
        let record: LockRecord = serde_json::from_str(content)
            .map_err(|e| ChmError::CorruptState(format!("failed to parse lock record: {}", e)))?;

        record.check_invariants()?;
        Ok(record)
    }

    /// Serialize the record for storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChmError::Io(format!("failed to serialize lock record: {}", e)))
    }

    /// Verify the owner set agrees with the lock kind.
    pub fn check_invariants(&self) -> Result<()> {
        match (self.kind, self.owners.len()) {
            (LockKind::Free, 0) => {}
            (LockKind::Free, n) => {
                return Err(ChmError::CorruptState(format!(
                    "lock is FREE but lists {} owner(s)",
                    n
                )));
            }
            (LockKind::Exclusive, 1) => {}
            (LockKind::Exclusive, n) => {
                return Err(ChmError::CorruptState(format!(
                    "EXCLUSIVE lock must have exactly one owner, found {}",
                    n
                )));
            }
            (LockKind::Shared, 0) => {
                return Err(ChmError::CorruptState(
                    "SHARED lock has no owners".to_string(),
                ));
            }
            (LockKind::Shared, _) => {}
        }

        let mut seen = HashSet::new();
        for owner in &self.owners {
            if !seen.insert(owner.email.as_str()) {
                return Err(ChmError::CorruptState(format!(
                    "owner '{}' is listed more than once",
                    owner.email
                )));
            }
        }

        Ok(())
    }

    /// Owner emails joined for display and status mirroring.
    pub fn owner_emails(&self) -> Vec<String> {
        self.owners.iter().map(|o| o.email.clone()).collect()
    }

    /// Waiter emails in queue order.
    pub fn waiter_emails(&self) -> Vec<String> {
        self.waiters.iter().map(|w| w.email.clone()).collect()
    }
}
