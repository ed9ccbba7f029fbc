//! Git command runner for chm.
//!
//! Used by `chm git-init` to bootstrap a repository on the chassis. All git
//! invocations go through [`run_git`] so failures carry stderr and the exit
//! code.

use crate::error::{ChmError, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Captured output of a successful git command.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output (trimmed).
    pub stdout: String,
    /// Standard error (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// Run `git <args>` in `cwd`.
///
/// Returns `GitError` if git cannot be started or exits non-zero.
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let output = Command::new("git")
        .current_dir(cwd.as_ref())
        .args(args)
        .output()
        .map_err(|e| {
            ChmError::GitError(format!(
                "failed to execute git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        let error_msg = if git_output.stderr.is_empty() {
            &git_output.stdout
        } else {
            &git_output.stderr
        };

        Err(ChmError::GitError(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            output.status.code().unwrap_or(-1),
            error_msg
        )))
    }
}

/// True if a `git` binary can be run.
pub fn is_git_installed() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// True if `path` is inside a git work tree.
pub fn is_git_repository<P: AsRef<Path>>(path: P) -> bool {
    run_git(path, &["rev-parse", "--is-inside-work-tree"])
        .map(|o| o.stdout == "true")
        .unwrap_or(false)
}

/// Initialize `path` as a new git repository.
///
/// Fails if git is unavailable, the directory does not exist, or it is
/// already part of a repository.
pub fn init_git_repo<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !is_git_installed() {
        return Err(ChmError::GitError(
            "could not find 'git'. Install git and retry.".to_string(),
        ));
    }

    if !path.is_dir() {
        return Err(ChmError::UserError(format!(
            "'{}' is not a directory",
            path.display()
        )));
    }

    if is_git_repository(path) {
        return Err(ChmError::UserError(format!(
            "Already a git repository: {}",
            path.display()
        )));
    }

    run_git(path, &["init"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_repo;
    use tempfile::TempDir;

    #[test]
    fn test_run_git_success() {
        let temp_dir = create_test_repo();
        let output = run_git(temp_dir.path(), &["rev-parse", "--abbrev-ref", "HEAD"]).unwrap();
        assert!(!output.stdout.is_empty());
    }

    #[test]
    fn test_run_git_failure_is_git_error() {
        let temp_dir = create_test_repo();
        let err = run_git(temp_dir.path(), &["checkout", "no-such-branch"]).unwrap_err();
        assert!(matches!(err, ChmError::GitError(_)));
        assert!(err.to_string().contains("git checkout failed"));
    }

    #[test]
    fn test_is_git_repository() {
        let repo = create_test_repo();
        assert!(is_git_repository(repo.path()));

        let plain = TempDir::new().unwrap();
        assert!(!is_git_repository(plain.path()));
    }

    #[test]
    fn test_init_git_repo_creates_repository() {
        let temp_dir = TempDir::new().unwrap();

        init_git_repo(temp_dir.path()).unwrap();

        assert!(temp_dir.path().join(".git").exists());
        assert!(is_git_repository(temp_dir.path()));
    }

    #[test]
    fn test_init_git_repo_refuses_existing_repository() {
        let repo = create_test_repo();

        let err = init_git_repo(repo.path()).unwrap_err();
        assert!(err.to_string().contains("Already a git repository"));
    }

    #[test]
    fn test_init_git_repo_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = init_git_repo(&missing).unwrap_err();
        assert!(matches!(err, ChmError::UserError(_)));
    }
}
