//! Config struct definition and defaults.

use crate::lock::DEFAULT_MAX_HISTORY;
use crate::notify::DEFAULT_NOTIFY_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of the managed chassis as written by `chm init`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Configuration for the chassis manager.
///
/// This struct represents `chm_config.yaml` in the state directory.
/// Every field is optional in the file; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Chassis identity
    // =========================================================================
    /// Name/IP overrides; host defaults are used for anything unset.
    pub chassis: ChassisConfig,

    // =========================================================================
    // Lock state
    // =========================================================================
    /// Lock record location. Relative paths are resolved against the state
    /// directory (default: `.chm_lock.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_file: Option<PathBuf>,

    /// Number of history entries kept before the oldest is evicted.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// How long a mutating command waits for another one to finish.
    #[serde(default = "default_store_lock_timeout_ms")]
    pub store_lock_timeout_ms: u64,

    /// Age after which a leftover state guard is considered abandoned.
    #[serde(default = "default_stale_guard_minutes")]
    pub stale_guard_minutes: u32,

    // =========================================================================
    // Collaborators
    // =========================================================================
    /// Mail command run as `<notify_command> <address>` with the message on
    /// stdin. Unset means waiters are dequeued without a message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_command: Option<String>,

    /// Seconds a single `notify_command` run may take before it is killed.
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    /// Where to mirror the current lock status as JSON. Unset disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chassis: ChassisConfig::default(),
            lock_file: None,
            max_history: default_max_history(),
            store_lock_timeout_ms: default_store_lock_timeout_ms(),
            stale_guard_minutes: default_stale_guard_minutes(),
            notify_command: None,
            notify_timeout_secs: default_notify_timeout_secs(),
            status_file: None,
        }
    }
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_store_lock_timeout_ms() -> u64 {
    2000
}

fn default_stale_guard_minutes() -> u32 {
    10
}

fn default_notify_timeout_secs() -> u64 {
    DEFAULT_NOTIFY_TIMEOUT.as_secs()
}
