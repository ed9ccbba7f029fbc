//! Cross-process guard around lock-state mutations.
//!
//! The guard is a file next to the lock record, created with `create_new`
//! semantics so only one process can hold it. It carries JSON metadata
//! naming the holder so a blocked caller can say who is in the way:
//! - `owner`: `user@HOST`
//! - `pid`: process ID
//! - `created_at`: RFC3339 timestamp
//! - `action`: the command holding the guard (lock/unlock/...)
//! - `token`: unique per acquisition
//!
//! A guard older than `stale_guard_minutes` is treated as left behind by a
//! crashed process. Age comes from `created_at`, or from the file's mtime
//! when the metadata cannot be read (a holder that died before writing it).
//! A stale guard is renamed to a private tombstone, re-checked there and
//! only then deleted, so two waiters cannot both remove it.
//!
//! On drop the guard file is deleted only if it still carries our token.

use crate::config::Config;
use crate::error::{ChmError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};
use tracing::{debug, warn};

/// Delay between attempts while another process holds the guard.
const POLL_INTERVAL_MS: u64 = 100;

static GUARD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Metadata written into the guard file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardMetadata {
    pub owner: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    pub created_at: DateTime<Utc>,

    pub action: String,

    #[serde(default)]
    pub token: String,
}

impl GuardMetadata {
    pub fn new(action: &str) -> Self {
        let created_at = Utc::now();
        let pid = std::process::id();
        let token = format!(
            "{}-{}-{}",
            pid,
            created_at.timestamp_nanos_opt().unwrap_or_default(),
            GUARD_SEQ.fetch_add(1, Ordering::Relaxed)
        );

        Self {
            owner: owner_string(),
            pid: Some(pid),
            created_at,
            action: action.to_string(),
            token,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ChmError::Io(format!(
                "failed to read guard file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ChmError::Io(format!(
                "failed to parse guard file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age().num_minutes() >= stale_minutes as i64
    }
}

fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Held guard; the guard file is removed when this is dropped.
#[derive(Debug)]
pub struct StoreGuard {
    path: PathBuf,
    token: String,
}

impl StoreGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        match GuardMetadata::from_file(&self.path) {
            Ok(meta) if meta.token == self.token => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!(path = %self.path.display(), error = %e, "failed to release state guard");
                }
            }
            Ok(meta) => {
                warn!(
                    path = %self.path.display(),
                    owner = %meta.owner,
                    action = %meta.action,
                    "state guard was taken over as stale; leaving the new holder's guard"
                );
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state guard gone before release");
            }
        }
    }
}

/// Take the guard at `path`, waiting up to `store_lock_timeout_ms`.
pub fn acquire_store_guard(path: &Path, action: &str, config: &Config) -> Result<StoreGuard> {
    let metadata = GuardMetadata::new(action);
    let deadline =
        Instant::now() + std::time::Duration::from_millis(config.store_lock_timeout_ms);

    loop {
        if let Some(guard) = try_create(path, &metadata)? {
            debug!(path = %path.display(), action, "state guard acquired");
            return Ok(guard);
        }

        if is_stale_guard(path, config.stale_guard_minutes) {
            reclaim_stale(path, &metadata.token, config.stale_guard_minutes)?;
            continue;
        }

        if Instant::now() >= deadline {
            let detail = match GuardMetadata::from_file(path) {
                Ok(meta) => format!(
                    "held by {} (pid {}) running '{}' since {}",
                    meta.owner,
                    meta.pid.map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
                    meta.action,
                    meta.created_at.to_rfc3339()
                ),
                Err(_) => format!("guard file '{}' exists", path.display()),
            };
            return Err(ChmError::StoreBusy(detail));
        }

        std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
    }
}

/// True if the guard at `path` exists and has outlived `stale_minutes`.
fn is_stale_guard(path: &Path, stale_minutes: u32) -> bool {
    match GuardMetadata::from_file(path) {
        Ok(meta) => meta.is_stale(stale_minutes),
        Err(_) => file_age(path)
            .is_some_and(|age| age.as_secs() >= u64::from(stale_minutes) * 60),
    }
}

fn file_age(path: &Path) -> Option<std::time::Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}

fn tombstone_path(path: &Path, token: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(OsString::from(format!(".stale-{}", token)));
    PathBuf::from(name)
}

/// Move the guard at `path` aside and delete it if it is still stale there.
///
/// If another waiter already replaced the stale guard, the file we moved is
/// a live guard; it is linked back into place.
fn reclaim_stale(path: &Path, token: &str, stale_minutes: u32) -> Result<()> {
    let tombstone = tombstone_path(path, token);

    match fs::rename(path, &tombstone) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(ChmError::Io(format!(
                "failed to move stale guard '{}': {}",
                path.display(),
                e
            )));
        }
    }

    if is_stale_guard(&tombstone, stale_minutes) {
        let holder = GuardMetadata::from_file(&tombstone).ok();
        warn!(
            path = %path.display(),
            owner = %holder.as_ref().map(|m| m.owner.as_str()).unwrap_or("?"),
            action = %holder.as_ref().map(|m| m.action.as_str()).unwrap_or("?"),
            "replacing stale state guard"
        );
    } else {
        debug!(path = %path.display(), "stale guard already replaced; restoring live guard");
        if let Err(e) = fs::hard_link(&tombstone, path) {
            warn!(path = %path.display(), error = %e, "failed to restore live state guard");
        }
    }

    if let Err(e) = fs::remove_file(&tombstone) {
        warn!(path = %tombstone.display(), error = %e, "failed to remove guard tombstone");
    }
    Ok(())
}

/// Returns `Ok(None)` when the guard file already exists.
fn try_create(path: &Path, metadata: &GuardMetadata) -> Result<Option<StoreGuard>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ChmError::Io(format!(
                "failed to create state directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(ChmError::Io(format!(
                "failed to create guard file '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| ChmError::Io(format!("failed to serialize guard metadata: {}", e)))?;

    if let Err(e) = file.write_all(json.as_bytes()).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(path);
        return Err(ChmError::Io(format!(
            "failed to write guard file '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(Some(StoreGuard {
        path: path.to_path_buf(),
        token: metadata.token.clone(),
    }))
}
