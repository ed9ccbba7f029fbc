//! State directory resolution for chm.
//!
//! Every chm file lives under one state directory:
//! - `chm_config.yaml`: configuration
//! - `.chm_lock.json`: the lock record (relocatable via `lock_file`)
//! - `.chm_lock.json.guard`: held while a command mutates the lock record
//!
//! The directory is taken from `--state-dir`, then `CHM_STATE_DIR`, then the
//! current working directory.

use crate::config::Config;
use crate::error::{ChmError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the state directory.
pub const STATE_DIR_ENV: &str = "CHM_STATE_DIR";

/// Config file name within the state directory.
pub const CONFIG_FILE_NAME: &str = "chm_config.yaml";

/// Default lock record file name within the state directory.
pub const DEFAULT_LOCK_FILE_NAME: &str = ".chm_lock.json";

/// Resolved location of chm state.
#[derive(Debug, Clone)]
pub struct ChmContext {
    /// Absolute path to the state directory.
    pub state_dir: PathBuf,
}

impl ChmContext {
    /// Resolve from an explicit directory, the environment, or the cwd.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(dir) = explicit {
            return Self::resolve_from(dir);
        }

        if let Some(dir) = env::var_os(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::resolve_from(PathBuf::from(dir));
        }

        let cwd = env::current_dir().map_err(|e| {
            ChmError::UserError(format!("failed to get current working directory: {}", e))
        })?;
        Self::resolve_from(cwd)
    }

    /// Use `dir` as the state directory, creating it if needed.
    pub fn resolve_from<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                ChmError::UserError(format!(
                    "failed to create state directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        if !dir.is_dir() {
            return Err(ChmError::UserError(format!(
                "state directory '{}' is not a directory",
                dir.display()
            )));
        }

        let state_dir = dir.canonicalize().map_err(|e| {
            ChmError::UserError(format!(
                "failed to resolve state directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self { state_dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE_NAME)
    }

    /// Lock record path, honoring `lock_file` from the config.
    pub fn lock_file_path(&self, config: &Config) -> PathBuf {
        match &config.lock_file {
            Some(path) => self.state_dir.join(path),
            None => self.state_dir.join(DEFAULT_LOCK_FILE_NAME),
        }
    }

    /// Guard file that sits next to the lock record.
    pub fn guard_path(&self, config: &Config) -> PathBuf {
        let mut name = self
            .lock_file_path(config)
            .into_os_string();
        name.push(".guard");
        PathBuf::from(name)
    }

    /// Status mirror path, if one is configured.
    pub fn status_path(&self, config: &Config) -> Option<PathBuf> {
        config
            .status_file
            .as_ref()
            .map(|path| self.state_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DirGuard, EnvGuard};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ChmContext::resolve_from(temp_dir.path()).unwrap();
        let config = Config::default();
        let root = temp_dir.path().canonicalize().unwrap();

        assert_eq!(ctx.state_dir, root);
        assert_eq!(ctx.config_path(), root.join("chm_config.yaml"));
        assert_eq!(ctx.lock_file_path(&config), root.join(".chm_lock.json"));
        assert_eq!(ctx.guard_path(&config), root.join(".chm_lock.json.guard"));
        assert_eq!(ctx.status_path(&config), None);
    }

    #[test]
    fn test_configured_paths() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ChmContext::resolve_from(temp_dir.path()).unwrap();
        let config = Config {
            lock_file: Some(PathBuf::from("state/lock.json")),
            status_file: Some(PathBuf::from("/srv/www/chassis.json")),
            ..Config::default()
        };

        assert_eq!(
            ctx.lock_file_path(&config),
            ctx.state_dir.join("state/lock.json")
        );
        assert_eq!(
            ctx.guard_path(&config),
            ctx.state_dir.join("state/lock.json.guard")
        );
        // Absolute paths are kept as-is by join.
        assert_eq!(
            ctx.status_path(&config),
            Some(PathBuf::from("/srv/www/chassis.json"))
        );
    }

    #[test]
    fn test_resolve_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("new").join("state");

        let ctx = ChmContext::resolve_from(&dir).unwrap();
        assert!(ctx.state_dir.is_dir());
    }

    #[test]
    fn test_resolve_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let err = ChmContext::resolve_from(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_explicit_then_env_then_cwd() {
        let explicit = TempDir::new().unwrap();
        let from_env = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();

        let _dir = DirGuard::new(cwd.path());
        let env = EnvGuard::set(STATE_DIR_ENV, from_env.path());

        let ctx = ChmContext::resolve(Some(explicit.path())).unwrap();
        assert_eq!(ctx.state_dir, explicit.path().canonicalize().unwrap());

        let ctx = ChmContext::resolve(None).unwrap();
        assert_eq!(ctx.state_dir, from_env.path().canonicalize().unwrap());

        drop(env);
        let ctx = ChmContext::resolve(None).unwrap();
        assert_eq!(ctx.state_dir, cwd.path().canonicalize().unwrap());
    }
}
