//! Notifier that hands each message to an external mail command.

use super::Notifier;
use crate::error::{ChmError, Result};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a mail command may run before it is killed.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `notify_command <address>` with the message on stdin.
///
/// The command string is split with shell-words, so quoting works as in a
/// shell but no shell is invoked.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    /// Parse a configured command line.
    pub fn from_command(command: &str) -> Result<Self> {
        let words = shell_words::split(command).map_err(|e| {
            ChmError::UserError(format!(
                "failed to parse notify_command '{}': {}\n\n\
                 Fix: check for unmatched quotes in chm_config.yaml notify_command.",
                command, e
            ))
        })?;

        let (program, args) = words.split_first().ok_or_else(|| {
            ChmError::UserError(
                "notify_command is empty after parsing.\n\n\
                 Fix: set notify_command to a mail program, e.g. \"sendmail\"."
                    .to_string(),
            )
        })?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn deliver(&self, address: &str, message: &str) -> std::io::Result<bool> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(address)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Dropping stdin closes the pipe so the command sees EOF.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(message.as_bytes()),
            None => Ok(()),
        };
        if let Err(e) = &write_result {
            debug!(program = %self.program, error = %e, "notify command did not read the whole message");
        }

        let Some(status) = wait_with_timeout(&mut child, self.timeout)? else {
            warn!(
                program = %self.program,
                timeout_secs = self.timeout.as_secs(),
                "notify command timed out and was killed"
            );
            return Ok(false);
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            warn!(
                program = %self.program,
                code = ?status.code(),
                stderr = %stderr.trim(),
                "notify command exited with failure"
            );
        }
        Ok(status.success())
    }
}

/// Wait for `child`, killing it once `timeout` has passed.
///
/// Returns `None` if the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(poll_interval);
    }
}

impl Notifier for CommandNotifier {
    fn send(&self, address: &str, message: &str) -> bool {
        match self.deliver(address, message) {
            Ok(delivered) => {
                debug!(%address, delivered, "notification attempted");
                delivered
            }
            Err(e) => {
                warn!(%address, program = %self.program, error = %e, "failed to run notify command");
                false
            }
        }
    }
}
