//! Chassis lock state machine.
//!
//! A single [`LockRecord`] describes who holds the chassis:
//! - `FREE`: no owners
//! - `EXCLUSIVE`: exactly one owner
//! - `SHARED`: one or more owners
//!
//! plus a FIFO queue of waiters and a bounded audit history (oldest entries
//! evicted first). [`LockManager`] applies acquire/release/enqueue/drain
//! operations and writes the whole record through a
//! [`LockStore`](crate::store::LockStore) after each one.

mod manager;
mod record;
mod types;


pub use manager::{
    DEFAULT_MAX_HISTORY, Granted, LockManager, NotifyOutcome, Released, notify_waiters,
};
pub use record::LockRecord;
pub use types::{ACTION_QUERIED, HistoryEntry, LockKind, Owner, Waiter};
