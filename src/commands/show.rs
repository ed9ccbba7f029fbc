//! Implementation of the `chm history` and `chm owners` commands.

use super::open_chassis;
use crate::error::Result;
use std::path::Path;

/// Execute the `chm history` command.
///
/// Prints one `<time> \t <email> --> <action>` line per entry, oldest first.
pub fn cmd_history(state_dir: Option<&Path>) -> Result<()> {
    let chm = open_chassis(state_dir)?;

    for line in chm.history_lines()? {
        println!("{}", line);
    }
    Ok(())
}

/// Execute the `chm owners` command.
pub fn cmd_owners(state_dir: Option<&Path>) -> Result<()> {
    let chm = open_chassis(state_dir)?;

    for line in chm.owner_lines()? {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChmError;
    use tempfile::TempDir;

    #[test]
    fn corrupt_lock_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".chm_lock.json"), "{\"Type\": \"FREE\"}").unwrap();

        let err = cmd_history(Some(temp_dir.path())).unwrap_err();
        assert!(matches!(err, ChmError::CorruptState(_)));

        let err = cmd_owners(Some(temp_dir.path())).unwrap_err();
        assert!(matches!(err, ChmError::CorruptState(_)));
    }
}
