//! Waiter notification.
//!
//! Delivery is best effort: a [`Notifier`] reports success as a bool and the
//! caller never retries. Waiters are removed from the queue before any
//! message is sent.

mod command;

pub use command::{CommandNotifier, DEFAULT_NOTIFY_TIMEOUT};

use crate::config::Config;
use crate::error::Result;
use std::time::Duration;
use tracing::info;

/// Delivers a message to one address.
pub trait Notifier {
    /// Attempt delivery. Returns `true` only if the transport accepted it.
    fn send(&self, address: &str, message: &str) -> bool;
}

/// Used when no `notify_command` is configured.
///
/// Logs the would-be recipient and reports the message as undelivered.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, address: &str, _message: &str) -> bool {
        info!(%address, "no notify_command configured; waiter not notified");
        false
    }
}

/// Build the notifier selected by the config.
pub fn from_config(config: &Config) -> Result<Box<dyn Notifier>> {
    match config.notify_command.as_deref() {
        Some(command) => Ok(Box::new(
            CommandNotifier::from_command(command)?
                .with_timeout(Duration::from_secs(config.notify_timeout_secs)),
        )),
        None => Ok(Box::new(LogNotifier)),
    }
}

/// Message sent to waiters when the chassis becomes free.
///
/// The first line is a mail `Subject:` header so the text can be piped
/// straight into `sendmail -t` style commands.
pub fn chassis_free_message(chassis_name: &str, chassis_ip: &str) -> String {
    let name = if chassis_name.is_empty() {
        "Chassis"
    } else {
        chassis_name
    };

    format!(
        "Subject: Chassis '{name}' is free now.\n\
         \n\
         Hi,\n\
         \n\
         The chassis '{name}' [{chassis_ip}], that you were waiting for, is free now.\n\
         Please hop on to the machine and lock it.\n\
         \n\
         Your friendly,\n\
         Chassis Manager\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_message_names_the_chassis() {
        let msg = chassis_free_message("rack3-node1", "10.10.10.10");
        assert!(msg.starts_with("Subject: Chassis 'rack3-node1' is free now.\n"));
        assert!(msg.contains("'rack3-node1' [10.10.10.10]"));
    }

    #[test]
    fn free_message_falls_back_to_generic_name() {
        let msg = chassis_free_message("", "10.0.0.1");
        assert!(msg.starts_with("Subject: Chassis 'Chassis' is free now."));
    }

    #[test]
    fn log_notifier_never_claims_delivery() {
        assert!(!LogNotifier.send("a@x", "hello"));
    }

    #[test]
    fn config_without_command_selects_log_notifier() {
        let config = Config::default();
        let notifier = from_config(&config).unwrap();
        assert!(!notifier.send("a@x", "hello"));
    }
}
