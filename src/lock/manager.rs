//! The lock state machine.

use super::record::LockRecord;
use super::types::{ACTION_QUERIED, HistoryEntry, LockKind, Owner, Waiter};
use crate::error::{ChmError, Result};
use crate::notify::Notifier;
use crate::store::LockStore;
use chrono::{Local, SubsecRound};
use tracing::{debug, info, warn};

/// Default cap on the number of history entries kept.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// A granted acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granted {
    pub kind: LockKind,
    pub owner_count: usize,
}

/// A successful release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    /// Lock kind after the release.
    pub kind: LockKind,
    pub remaining_owners: usize,
}

/// Result of draining the waiter queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    /// Entries removed from the queue.
    pub drained: usize,
    /// Entries whose message the notifier accepted.
    pub delivered: usize,
}

/// Owns the lock record and persists it after every mutation.
///
/// Every acquisition attempt is written to the history, including denials.
/// A release by a non-owner is the only refusal that leaves no trace.
pub struct LockManager<S: LockStore> {
    record: LockRecord,
    store: S,
    max_history: usize,
}

impl<S: LockStore> LockManager<S> {
    /// Load the record from `store`, starting FREE if none exists yet.
    pub fn open(store: S, max_history: usize) -> Result<Self> {
        let record = store.load()?.unwrap_or_default();
        Ok(Self::with_record(record, store, max_history))
    }

    /// Wrap an already loaded record.
    pub fn with_record(record: LockRecord, store: S, max_history: usize) -> Self {
        Self {
            record,
            store,
            max_history,
        }
    }

    pub fn kind(&self) -> LockKind {
        self.record.kind
    }

    pub fn owners(&self) -> &[Owner] {
        &self.record.owners
    }

    pub fn waiters(&self) -> &[Waiter] {
        &self.record.waiters
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.record.history
    }

    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Owner membership is by email only.
    pub fn is_owner(&self, email: &str) -> bool {
        self.record.owners.iter().any(|o| o.email == email)
    }

    /// Request `mode` for the given identity.
    ///
    /// | current   | requested | outcome                                     |
    /// |-----------|-----------|---------------------------------------------|
    /// | FREE      | any       | granted                                     |
    /// | EXCLUSIVE | any       | `AlreadyOwner` or `NotAvailable`            |
    /// | SHARED    | SHARED    | granted, or `AlreadyOwner` for an owner     |
    /// | SHARED    | EXCLUSIVE | `OnlySharedAllowed`                         |
    ///
    /// Denials are recorded as `Queried` and persisted before returning.
    pub fn acquire(&mut self, mode: LockKind, name: &str, email: &str) -> Result<Granted> {
        match (self.record.kind, mode) {
            (_, LockKind::Free) => Err(ChmError::Internal(format!(
                "'{}' requested a FREE lock; only EXCLUSIVE or SHARED can be acquired",
                email
            ))),
            (LockKind::Free, requested) => {
                let mut next = self.record.clone();
                next.kind = requested;
                next.owners = vec![Owner {
                    name: name.to_string(),
                    email: email.to_string(),
                }];
                self.push_history(&mut next, email, requested.action());
                self.commit(next)?;
                info!(%email, kind = %requested, "lock granted");
                Ok(self.granted())
            }
            (LockKind::Exclusive, _) => {
                let reason = if self.is_owner(email) {
                    ChmError::AlreadyOwner
                } else {
                    ChmError::NotAvailable
                };
                self.deny(email, reason)
            }
            (LockKind::Shared, LockKind::Shared) => {
                if self.is_owner(email) {
                    return self.deny(email, ChmError::AlreadyOwner);
                }
                let mut next = self.record.clone();
                next.owners.push(Owner {
                    name: name.to_string(),
                    email: email.to_string(),
                });
                self.push_history(&mut next, email, LockKind::Shared.action());
                self.commit(next)?;
                info!(%email, owners = self.record.owners.len(), "shared lock joined");
                Ok(self.granted())
            }
            (LockKind::Shared, LockKind::Exclusive) => {
                self.deny(email, ChmError::OnlySharedAllowed)
            }
        }
    }

    /// Give up the grant held by `email`.
    ///
    /// The lock becomes FREE unless other shared owners remain.
    pub fn release(&mut self, email: &str) -> Result<Released> {
        if !self.is_owner(email) {
            return Err(ChmError::NotAnOwner);
        }

        let mut next = self.record.clone();
        let was = next.kind;
        self.push_history(&mut next, email, LockKind::Free.action());

        if was != LockKind::Free {
            next.owners.retain(|o| o.email != email);
            if was == LockKind::Exclusive || next.owners.is_empty() {
                next.kind = LockKind::Free;
            }
        }

        self.commit(next)?;
        info!(%email, kind = %self.record.kind, remaining = self.record.owners.len(), "lock released");

        Ok(Released {
            kind: self.record.kind,
            remaining_owners: self.record.owners.len(),
        })
    }

    /// Append to the waiter queue. No duplicate or state checks.
    pub fn enqueue_waiter(&mut self, email: &str, notify: bool) -> Result<()> {
        let mut next = self.record.clone();
        next.waiters.push(Waiter {
            email: email.to_string(),
            notify,
        });
        self.commit(next)?;
        debug!(%email, notify, queued = self.record.waiters.len(), "waiter enqueued");
        Ok(())
    }

    /// Empty the waiter queue and message every waiter that asked for it.
    ///
    /// The cleared queue is persisted before any message is sent, so each
    /// waiter gets at most one attempt. Failed sends are logged and counted
    /// only in `drained`.
    pub fn drain_and_notify_waiters(
        &mut self,
        notifier: &dyn Notifier,
        message: &str,
    ) -> Result<NotifyOutcome> {
        let waiters = self.take_waiters()?;
        Ok(notify_waiters(notifier, &waiters, message))
    }

    /// Empty the waiter queue, persist, and hand back the removed entries.
    pub fn take_waiters(&mut self) -> Result<Vec<Waiter>> {
        let mut next = self.record.clone();
        let waiters = std::mem::take(&mut next.waiters);
        self.commit(next)?;
        Ok(waiters)
    }

    /// Record an audit entry and persist.
    pub fn append_history(&mut self, email: &str, action: &str) -> Result<()> {
        let mut next = self.record.clone();
        self.push_history(&mut next, email, action);
        self.commit(next)
    }

    /// Write the full record to the store.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.record)
    }

    /// Persist `next` and adopt it. On failure the current record is kept.
    fn commit(&mut self, next: LockRecord) -> Result<()> {
        self.store.save(&next)?;
        self.record = next;
        Ok(())
    }

    fn push_history(&self, record: &mut LockRecord, email: &str, action: &str) {
        record.history.push(HistoryEntry {
            time: Local::now().naive_local().trunc_subsecs(6),
            email: email.to_string(),
            action: action.to_string(),
        });

        let excess = record.history.len().saturating_sub(self.max_history);
        if excess > 0 {
            record.history.drain(..excess);
        }
    }

    fn deny(&mut self, email: &str, reason: ChmError) -> Result<Granted> {
        let mut next = self.record.clone();
        self.push_history(&mut next, email, ACTION_QUERIED);
        self.commit(next)?;
        debug!(%email, %reason, "lock request denied");
        Err(reason)
    }

    fn granted(&self) -> Granted {
        Granted {
            kind: self.record.kind,
            owner_count: self.record.owners.len(),
        }
    }
}

/// Message every waiter in `waiters` that asked for it, in queue order.
pub fn notify_waiters(notifier: &dyn Notifier, waiters: &[Waiter], message: &str) -> NotifyOutcome {
    let mut outcome = NotifyOutcome {
        drained: waiters.len(),
        delivered: 0,
    };

    for waiter in waiters {
        if !waiter.notify {
            debug!(email = %waiter.email, "waiter did not ask for notification");
            continue;
        }
        if notifier.send(&waiter.email, message) {
            outcome.delivered += 1;
        } else {
            warn!(email = %waiter.email, "could not notify waiter");
        }
    }

    outcome
}
