//! Command implementations for chm.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every handler resolves the state directory, loads the
//! config once, and prints its result to stdout.

mod init;
mod lock;
mod show;
mod status;

use crate::chassis::ChassisManager;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::ChmContext;
use crate::error::Result;
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let state_dir = cli.state_dir.as_deref();

    match cli.command {
        Command::Lock(args) => lock::cmd_lock(state_dir, args),
        Command::Unlock(args) => lock::cmd_unlock(state_dir, args),
        Command::History => show::cmd_history(state_dir),
        Command::Owners => show::cmd_owners(state_dir),
        Command::Status => status::cmd_status(state_dir),
        Command::Init(args) => init::cmd_init(state_dir, args),
        Command::GitInit(args) => init::cmd_git_init(args),
    }
}

/// Resolve the state directory and build the orchestrator from its config.
fn open_chassis(state_dir: Option<&Path>) -> Result<ChassisManager> {
    let ctx = ChmContext::resolve(state_dir)?;
    let config = Config::load_or_default(ctx.config_path())?;
    ChassisManager::open(ctx, config)
}
