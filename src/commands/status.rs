//! Implementation of the `chm status` command.
//!
//! Displays the chassis identity, lock kind, owners, and waiters.

use super::open_chassis;
use crate::error::Result;
use crate::report::LockStatus;
use std::path::Path;

/// Execute the `chm status` command.
pub fn cmd_status(state_dir: Option<&Path>) -> Result<()> {
    let chm = open_chassis(state_dir)?;
    let status = chm.status()?;

    print!("{}", render_status(&status));
    Ok(())
}

fn render_status(status: &LockStatus) -> String {
    let mut out = String::new();

    out.push_str(&format!("Chassis:  {} [{}]\n", status.chassis_name, status.chassis_ip));
    out.push_str(&format!("Lock:     {}\n", status.lock));

    if status.owners.is_empty() {
        out.push_str("Owners:   -\n");
    } else {
        out.push_str(&format!("Owners:   {}\n", status.owners.join(", ")));
    }

    if status.waiters.is_empty() {
        out.push_str("Waiters:  -\n");
    } else {
        out.push_str(&format!("Waiters:  {}\n", status.waiters.join(", ")));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn render_lists_owners_and_waiters() {
        let status = LockStatus {
            chassis_name: "gullu".to_string(),
            chassis_ip: "10.10.10.10".to_string(),
            lock: "SHARED".to_string(),
            owners: vec!["a@x".to_string(), "b@x".to_string()],
            waiters: vec!["c@x".to_string()],
            updated_at: Utc::now(),
        };

        let out = render_status(&status);
        assert!(out.contains("Chassis:  gullu [10.10.10.10]"));
        assert!(out.contains("Lock:     SHARED"));
        assert!(out.contains("Owners:   a@x, b@x"));
        assert!(out.contains("Waiters:  c@x"));
    }

    #[test]
    fn render_free_chassis() {
        let status = LockStatus {
            chassis_name: "gullu".to_string(),
            chassis_ip: "10.10.10.10".to_string(),
            lock: "FREE".to_string(),
            owners: Vec::new(),
            waiters: Vec::new(),
            updated_at: Utc::now(),
        };

        let out = render_status(&status);
        assert!(out.contains("Owners:   -"));
        assert!(out.contains("Waiters:  -"));
    }
}
