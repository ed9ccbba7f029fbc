//! Mirroring of the current lock status for outside observers.
//!
//! The lock file stays the source of truth. A [`ReportingSink`] receives a
//! [`LockStatus`] after each command; if publishing fails the command still
//! succeeds and the next publish catches the mirror up.

use crate::config::Config;
use crate::context::ChmContext;
use crate::error::{ChmError, Result};
use crate::lock::LockRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of what an observer needs to know about the chassis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub chassis_name: String,
    pub chassis_ip: String,
    /// `FREE`, `EXCLUSIVE` or `SHARED`.
    pub lock: String,
    pub owners: Vec<String>,
    pub waiters: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl LockStatus {
    pub fn new(chassis_name: &str, chassis_ip: &str, record: &LockRecord) -> Self {
        Self {
            chassis_name: chassis_name.to_string(),
            chassis_ip: chassis_ip.to_string(),
            lock: record.kind.as_str().to_string(),
            owners: record.owner_emails(),
            waiters: record.waiter_emails(),
            updated_at: Utc::now(),
        }
    }
}

/// Receives status snapshots.
pub trait ReportingSink {
    fn publish(&self, status: &LockStatus) -> Result<()>;
}

/// Discards snapshots; used when no `status_file` is configured.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportingSink for NullSink {
    fn publish(&self, _status: &LockStatus) -> Result<()> {
        Ok(())
    }
}

/// Writes each snapshot as pretty JSON, replacing the previous one.
#[derive(Debug, Clone)]
pub struct StatusFileSink {
    path: PathBuf,
}

impl StatusFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ReportingSink for StatusFileSink {
    fn publish(&self, status: &LockStatus) -> Result<()> {
        let json = serde_json::to_string_pretty(status)
            .map_err(|e| ChmError::Io(format!("failed to serialize lock status: {}", e)))?;
        crate::fs::atomic_write_file(&self.path, &json)
    }
}

/// Build the sink selected by the config.
pub fn from_config(ctx: &ChmContext, config: &Config) -> Box<dyn ReportingSink> {
    match ctx.status_path(config) {
        Some(path) => Box::new(StatusFileSink::new(path)),
        None => Box::new(NullSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockKind, Owner, Waiter};
    use tempfile::TempDir;

    fn shared_record() -> LockRecord {
        LockRecord {
            kind: LockKind::Shared,
            owners: vec![
                Owner {
                    name: "a".to_string(),
                    email: "a@x".to_string(),
                },
                Owner {
                    name: "b".to_string(),
                    email: "b@x".to_string(),
                },
            ],
            waiters: vec![Waiter {
                email: "c@x".to_string(),
                notify: true,
            }],
            history: Vec::new(),
        }
    }

    #[test]
    fn status_lists_emails_in_order() {
        let status = LockStatus::new("gullu", "10.10.10.10", &shared_record());
        assert_eq!(status.lock, "SHARED");
        assert_eq!(status.owners, vec!["a@x", "b@x"]);
        assert_eq!(status.waiters, vec!["c@x"]);
    }

    #[test]
    fn status_file_sink_writes_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("www").join("chassis.json");
        let sink = StatusFileSink::new(&path);

        let status = LockStatus::new("gullu", "10.10.10.10", &shared_record());
        sink.publish(&status).unwrap();

        let written: LockStatus =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, status);
    }

    #[test]
    fn status_file_sink_reports_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        // Parent "directory" is a regular file.
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let sink = StatusFileSink::new(blocker.join("chassis.json"));

        let status = LockStatus::new("gullu", "10.10.10.10", &LockRecord::default());
        assert!(matches!(sink.publish(&status), Err(ChmError::Io(_))));
    }

    #[test]
    fn config_without_status_file_uses_null_sink() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ChmContext::resolve_from(temp_dir.path()).unwrap();
        let sink = from_config(&ctx, &Config::default());

        let status = LockStatus::new("gullu", "10.10.10.10", &LockRecord::default());
        sink.publish(&status).unwrap();
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
