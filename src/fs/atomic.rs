//! Atomic file writes for chm state files.
//!
//! The lock record, the config file and the status snapshot are all
//! replaced as a whole:
//! 1. Write content to `.{filename}.tmp` in the target's directory
//! 2. Sync the temporary file to disk
//! 3. Rename it over the target
//!
//! `rename` replaces the destination on both POSIX and Windows, and is atomic
//! when source and destination share a filesystem, which holds because the
//! temporary file lives next to the target. A crash can leave the `.tmp`
//! file behind; it is overwritten by the next write.

use crate::error::{ChmError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ChmError::Io(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ChmError::Io(format!("failed to replace '{}': {}", path.display(), e))
    })?;

    // Persist the directory entry as well; best effort.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Convenience wrapper around [`atomic_write`] for string content.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ChmError::Io(format!("invalid file path '{}'", target.display())))?;

    let temp_name = format!(".{}.tmp", filename);
    Ok(match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        ChmError::Io(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let written = file.write_all(content).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(ChmError::Io(format!(
            "failed to write temporary file '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".chm_lock.json");

        atomic_write(&file_path, br#"{"Type":"FREE"}"#).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, r#"{"Type":"FREE"}"#);
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("chm_config.yaml");
        fs::write(&file_path, "max_history: 10\n").unwrap();

        atomic_write_file(&file_path, "max_history: 20\n").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "max_history: 20\n");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("lab").join("rack3").join("status.json");

        atomic_write_file(&file_path, "{}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".chm_lock.json");

        atomic_write(&file_path, b"{}").unwrap();

        assert!(!temp_dir.path().join("..chm_lock.json.tmp").exists());
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/var/lib/chm/status.json")).unwrap();
        assert_eq!(temp, Path::new("/var/lib/chm/.status.json.tmp"));
    }

    #[test]
    fn test_atomic_write_over_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the target path cannot be replaced by a file.
        let target = temp_dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("child"), "x").unwrap();

        let result = atomic_write(&target, b"data");
        assert!(matches!(result, Err(ChmError::Io(_))));
    }
}
