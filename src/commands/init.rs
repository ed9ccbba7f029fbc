//! Implementation of the `chm init` and `chm git-init` commands.

use super::open_chassis;
use crate::cli::{GitInitArgs, InitArgs};
use crate::error::Result;
use crate::git::init_git_repo;
use std::path::Path;

/// Execute the `chm init` command.
///
/// Rewrites the chassis section of `chm_config.yaml`, keeping every other
/// setting.
pub fn cmd_init(state_dir: Option<&Path>, args: InitArgs) -> Result<()> {
    let mut chm = open_chassis(state_dir)?;

    chm.init_chassis(&args.name, &args.ip)?;

    println!("Chassis initialized successfully");
    Ok(())
}

/// Execute the `chm git-init` command.
pub fn cmd_git_init(args: GitInitArgs) -> Result<()> {
    init_git_repo(&args.path)?;

    println!("Git repository initialized successfully");
    Ok(())
}
