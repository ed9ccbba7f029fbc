//! Chassis orchestrator.
//!
//! Ties the lock state machine to its collaborators for one CLI invocation:
//! the JSON store (behind the cross-process guard), the waiter notifier and
//! the status sink. Each mutating call runs load-mutate-save while holding
//! the guard, then publishes a status snapshot.

use crate::config::{ChassisConfig, Config};
use crate::context::ChmContext;
use crate::error::{ChmError, Result};
use crate::lock::{Granted, LockKind, LockManager, NotifyOutcome, notify_waiters};
use crate::notify::{self, Notifier};
use crate::report::{self, LockStatus, ReportingSink};
use crate::store::{JsonFileStore, StoreGuard, acquire_store_guard};
use std::net::{IpAddr, ToSocketAddrs};
use tracing::{debug, info, warn};

/// IP reported when the host name does not resolve.
const FALLBACK_IP: &str = "127.0.0.1";

/// Name and address used in notifications and status snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChassisIdentity {
    pub name: String,
    pub ip: String,
}

impl ChassisIdentity {
    /// Config values win; anything unset falls back to the host.
    pub fn resolve(chassis: &ChassisConfig) -> Self {
        let name = non_empty(chassis.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(default_name);
        let ip = non_empty(chassis.ip.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| default_ip(&name));
        Self { name, ip }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "Chassis".to_string())
}

fn default_ip(host: &str) -> String {
    let resolved = (host, 0).to_socket_addrs().ok().and_then(|mut addrs| {
        addrs
            .find(|addr| addr.is_ipv4())
            .map(|addr| addr.ip())
    });

    match resolved {
        Some(IpAddr::V4(ip)) => ip.to_string(),
        _ => {
            debug!(%host, "host name did not resolve to an IPv4 address");
            FALLBACK_IP.to_string()
        }
    }
}

/// Runs chassis lock operations against the state directory.
pub struct ChassisManager {
    ctx: ChmContext,
    config: Config,
    identity: ChassisIdentity,
    notifier: Box<dyn Notifier>,
    sink: Box<dyn ReportingSink>,
}

impl ChassisManager {
    /// Build the manager with the notifier and sink selected by `config`.
    pub fn open(ctx: ChmContext, config: Config) -> Result<Self> {
        let notifier = notify::from_config(&config)?;
        let sink = report::from_config(&ctx, &config);
        Ok(Self::with_parts(ctx, config, notifier, sink))
    }

    pub fn with_parts(
        ctx: ChmContext,
        config: Config,
        notifier: Box<dyn Notifier>,
        sink: Box<dyn ReportingSink>,
    ) -> Self {
        let identity = ChassisIdentity::resolve(&config.chassis);
        Self {
            ctx,
            config,
            identity,
            notifier,
            sink,
        }
    }

    pub fn identity(&self) -> &ChassisIdentity {
        &self.identity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Request `kind` for `email`.
    ///
    /// With `wait`, a `NotAvailable` or `OnlySharedAllowed` denial also
    /// queues the requester for a "chassis is free" message. The denial is
    /// still returned.
    pub fn lock(&self, kind: LockKind, name: &str, email: &str, wait: bool) -> Result<Granted> {
        let _guard = self.guard("lock")?;
        let mut manager = self.load()?;

        let result = manager.acquire(kind, name, email);

        if let Err(err) = &result {
            if !err.is_denial() {
                return result;
            }
            if wait && matches!(err, ChmError::NotAvailable | ChmError::OnlySharedAllowed) {
                manager.enqueue_waiter(email, true)?;
                info!(%email, "queued for notification");
            }
        }

        self.publish(&manager);
        result
    }

    /// Release the grant held by `email`.
    ///
    /// When the chassis ends up FREE, every queued waiter is dequeued and the
    /// ones that asked for it are messaged. Messages go out after the guard
    /// is released, so a slow mail command never holds up other writers.
    pub fn unlock(&self, email: &str) -> Result<NotifyOutcome> {
        let guard = self.guard("unlock")?;
        let mut manager = self.load()?;

        let released = manager.release(email)?;

        let waiters = if released.kind == LockKind::Free && !manager.waiters().is_empty() {
            manager.take_waiters()?
        } else {
            Vec::new()
        };
        drop(guard);

        self.publish(&manager);

        if waiters.is_empty() {
            return Ok(NotifyOutcome::default());
        }
        let message = notify::chassis_free_message(&self.identity.name, &self.identity.ip);
        Ok(notify_waiters(self.notifier.as_ref(), &waiters, &message))
    }

    /// One line per history entry, oldest first.
    pub fn history_lines(&self) -> Result<Vec<String>> {
        let manager = self.load()?;
        if manager.history().is_empty() {
            return Ok(vec!["No history available".to_string()]);
        }
        Ok(manager.history().iter().map(|e| e.to_string()).collect())
    }

    /// Owner emails in grant order.
    pub fn owner_lines(&self) -> Result<Vec<String>> {
        let manager = self.load()?;
        if manager.owners().is_empty() {
            return Ok(vec!["Lock is free".to_string()]);
        }
        Ok(manager.owners().iter().map(|o| o.email.clone()).collect())
    }

    /// Current snapshot, as it would be published.
    pub fn status(&self) -> Result<LockStatus> {
        let manager = self.load()?;
        Ok(self.snapshot(&manager))
    }

    /// Store the chassis identity in the config file and publish it.
    ///
    /// Empty values keep the current setting.
    pub fn init_chassis(&mut self, name: &str, ip: &str) -> Result<()> {
        if let Some(name) = non_empty(Some(name)) {
            self.config.chassis.name = Some(name.to_string());
        }
        if let Some(ip) = non_empty(Some(ip)) {
            self.config.chassis.ip = Some(ip.to_string());
        }

        self.config.save(self.ctx.config_path())?;
        self.identity = ChassisIdentity::resolve(&self.config.chassis);
        info!(name = %self.identity.name, ip = %self.identity.ip, "chassis initialized");

        let manager = self.load()?;
        self.publish(&manager);
        Ok(())
    }

    fn guard(&self, action: &str) -> Result<StoreGuard> {
        acquire_store_guard(&self.ctx.guard_path(&self.config), action, &self.config)
    }

    fn load(&self) -> Result<LockManager<JsonFileStore>> {
        let store = JsonFileStore::new(self.ctx.lock_file_path(&self.config));
        LockManager::open(store, self.config.max_history)
    }

    fn snapshot(&self, manager: &LockManager<JsonFileStore>) -> LockStatus {
        LockStatus::new(&self.identity.name, &self.identity.ip, manager.record())
    }

    fn publish(&self, manager: &LockManager<JsonFileStore>) {
        if let Err(e) = self.sink.publish(&self.snapshot(manager)) {
            warn!(error = %e, "failed to publish lock status");
        }
    }
}
