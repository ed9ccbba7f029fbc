//! CLI argument parsing for chm.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::exit_codes;
use crate::lock::LockKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// chm: exclusive/shared lock manager for a shared lab chassis.
///
/// State lives in one directory:
/// - `.chm_lock.json` holds owners, waiters, and the audit history
/// - `chm_config.yaml` holds the chassis identity and collaborators
#[derive(Parser, Debug)]
#[command(name = "chm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding chm state (default: $CHM_STATE_DIR, then the
    /// current directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for chm.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lock the chassis.
    ///
    /// Grants the lock or reports why it is unavailable. With --notify a
    /// denied request is queued for a message once the chassis is free.
    Lock(LockArgs),

    /// Unlock the chassis.
    ///
    /// When the chassis becomes free, queued waiters are notified.
    Unlock(UnlockArgs),

    /// Print the lock history.
    History,

    /// Print the lock owners.
    Owners,

    /// Print the chassis and lock status.
    Status,

    /// Store the chassis name and IP.
    Init(InitArgs),

    /// Initialize a git repository at the given path.
    #[command(name = "git-init")]
    GitInit(GitInitArgs),
}

/// Lock mode accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    Shared,
}

impl From<LockMode> for LockKind {
    fn from(mode: LockMode) -> Self {
        match mode {
            LockMode::Exclusive => LockKind::Exclusive,
            LockMode::Shared => LockKind::Shared,
        }
    }
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Lock type.
    #[arg(long = "type", value_enum)]
    pub lock_type: LockMode,

    /// Your name.
    #[arg(long)]
    pub name: String,

    /// Your email address.
    #[arg(long)]
    pub email: String,

    /// Queue for a message when the chassis becomes free.
    #[arg(long)]
    pub notify: bool,
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Email address the lock was taken with.
    #[arg(long)]
    pub email: String,
}

/// Arguments for the `init` command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Chassis name.
    #[arg(long)]
    pub name: String,

    /// Chassis IP address.
    #[arg(long)]
    pub ip: String,
}

/// Arguments for the `git-init` command.
#[derive(Parser, Debug)]
pub struct GitInitArgs {
    /// Directory to initialize.
    pub path: PathBuf,
}

impl Cli {
    /// Parse command-line arguments.
    ///
    /// Help and version requests also come back as `Err`; see
    /// [`parse_exit_code`].
    pub fn parse_args() -> std::result::Result<Self, clap::Error> {
        Self::try_parse()
    }
}

/// Exit code for a parse result that did not produce a command.
///
/// `--help` and `--version` succeed; every usage error is a failure.
pub fn parse_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        exit_codes::FAILURE
    } else {
        exit_codes::SUCCESS
    }
}
