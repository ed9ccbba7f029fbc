//! Config loading, validation, and saving.

use super::model::Config;
use crate::error::{ChmError, Result};
use crate::notify::CommandNotifier;
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ChmError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            ChmError::UserError(format!("{} (in '{}')", e, path.display()))
        })
    }

    /// Load config, treating a missing file as all defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ChmError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ChmError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Atomically write the config file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        crate::fs::atomic_write_file(path, &yaml)
    }

    /// Validation rules:
    /// - `max_history` must be positive
    /// - `stale_guard_minutes` must be positive
    /// - `notify_timeout_secs` must be positive
    /// - `notify_command`, when set, must parse into a program and arguments
    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(ChmError::UserError(
                "config validation failed: max_history must be greater than 0".to_string(),
            ));
        }

        if self.stale_guard_minutes == 0 {
            return Err(ChmError::UserError(
                "config validation failed: stale_guard_minutes must be greater than 0"
                    .to_string(),
            ));
        }

        if self.notify_timeout_secs == 0 {
            return Err(ChmError::UserError(
                "config validation failed: notify_timeout_secs must be greater than 0"
                    .to_string(),
            ));
        }

        if let Some(command) = &self.notify_command {
            CommandNotifier::from_command(command)?;
        }

        Ok(())
    }
}
