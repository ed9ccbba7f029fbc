//! Value types stored in the lock record.

use crate::error::ChmError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// History action for a denied or redundant request.
pub const ACTION_QUERIED: &str = "Queried";

/// Current mode of the chassis lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LockKind {
    /// Nobody holds the chassis.
    Free,
    /// A single owner holds the chassis.
    Exclusive,
    /// One or more owners share the chassis.
    Shared,
}

impl LockKind {
    /// Persisted name of this kind (`FREE`, `EXCLUSIVE`, `SHARED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LockKind::Free => "FREE",
            LockKind::Exclusive => "EXCLUSIVE",
            LockKind::Shared => "SHARED",
        }
    }

    /// History action recorded when this kind is granted.
    ///
    /// Releasing is recorded as the `Free` action.
    pub fn action(&self) -> &'static str {
        match self {
            LockKind::Free => "Unlock",
            LockKind::Exclusive => "Exclusive lock",
            LockKind::Shared => "Shared lock",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockKind {
    type Err = ChmError;

    /// Case-insensitive: `exclusive`, `Shared` and `FREE` are all accepted.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "exclusive" => Ok(LockKind::Exclusive),
            "shared" => Ok(LockKind::Shared),
            "free" => Ok(LockKind::Free),
            _ => Err(ChmError::InvalidLockName(name.to_string())),
        }
    }
}

impl TryFrom<String> for LockKind {
    type Error = ChmError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<LockKind> for String {
    fn from(kind: LockKind) -> Self {
        kind.as_str().to_string()
    }
}

/// An identity currently holding a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Owner {
    pub name: String,
    pub email: String,
}

/// An identity queued to hear when the chassis becomes free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Waiter {
    pub email: String,
    /// Whether a message should be sent when the queue is drained.
    pub notify: bool,
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
    pub email: String,
    pub action: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \t {} --> {}",
            self.time.format(local_time::FORMAT),
            self.email,
            self.action
        )
    }
}

/// Local wall-clock timestamps as `YYYY-MM-DD HH:MM:SS.ffffff`.
///
/// The fractional part is optional when reading.
pub(crate) mod local_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
    const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn serialize<S: Serializer>(
        time: &NaiveDateTime,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, PARSE_FORMAT).map_err(serde::de::Error::custom)
    }
}
