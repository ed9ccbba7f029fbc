//! Implementation of the `chm lock` and `chm unlock` commands.

use super::open_chassis;
use crate::cli::{LockArgs, UnlockArgs};
use crate::error::Result;
use std::path::Path;

/// Execute the `chm lock` command.
///
/// A denied request exits non-zero even when `--notify` queued it.
pub fn cmd_lock(state_dir: Option<&Path>, args: LockArgs) -> Result<()> {
    let chm = open_chassis(state_dir)?;

    chm.lock(args.lock_type.into(), &args.name, &args.email, args.notify)?;

    println!("Lock acquired successfully");
    Ok(())
}

/// Execute the `chm unlock` command.
pub fn cmd_unlock(state_dir: Option<&Path>, args: UnlockArgs) -> Result<()> {
    let chm = open_chassis(state_dir)?;

    let outcome = chm.unlock(&args.email)?;

    println!("Lock released successfully");
    println!("{} waiters notified", outcome.delivered);
    Ok(())
}
