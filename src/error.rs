//! Error types for the chm CLI.
//!
//! Uses thiserror for derive macros. Lock denials are ordinary variants so
//! callers can match on them; they are still recorded in the lock history
//! before being returned.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for chassis manager operations.
#[derive(Error, Debug)]
pub enum ChmError {
    /// An exclusive lock is held by someone else.
    #[error("Lock not available")]
    NotAvailable,

    /// A shared lock is held and an exclusive one was requested.
    #[error("Only Shared lock allowed")]
    OnlySharedAllowed,

    /// The requester already holds the grant they asked for.
    #[error("User already owns the lock")]
    AlreadyOwner,

    /// Release attempted by someone who does not hold the lock.
    #[error("User is not an owner")]
    NotAnOwner,

    /// A state/request combination the transition table does not cover.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The persisted lock record could not be decoded.
    #[error("Corrupt lock state: {0}")]
    CorruptState(String),

    /// Unknown lock type name.
    #[error("Invalid lock name '{0}'")]
    InvalidLockName(String),

    /// Reading or writing persisted state failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Another process holds the state guard.
    #[error("Lock state is busy: {0}")]
    StoreBusy(String),

    /// Bad arguments, bad config, or an invalid environment.
    #[error("{0}")]
    UserError(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    GitError(String),
}

impl ChmError {
    /// True for the four outcomes of a refused lock/unlock request.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            ChmError::NotAvailable
                | ChmError::OnlySharedAllowed
                | ChmError::AlreadyOwner
                | ChmError::NotAnOwner
        )
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        exit_codes::FAILURE
    }
}

/// Result type alias for chm operations.
pub type Result<T> = std::result::Result<T, ChmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_messages_match_cli_wording() {
        assert_eq!(ChmError::NotAvailable.to_string(), "Lock not available");
        assert_eq!(
            ChmError::OnlySharedAllowed.to_string(),
            "Only Shared lock allowed"
        );
        assert_eq!(
            ChmError::AlreadyOwner.to_string(),
            "User already owns the lock"
        );
        assert_eq!(ChmError::NotAnOwner.to_string(), "User is not an owner");
    }

    #[test]
    fn denials_are_distinguished_from_failures() {
        assert!(ChmError::NotAvailable.is_denial());
        assert!(ChmError::NotAnOwner.is_denial());
        assert!(!ChmError::Io("disk full".to_string()).is_denial());
        assert!(!ChmError::Internal("bad branch".to_string()).is_denial());
    }

    #[test]
    fn every_error_exits_with_failure() {
        let errors = [
            ChmError::NotAvailable,
            ChmError::CorruptState("x".to_string()),
            ChmError::GitError("x".to_string()),
            ChmError::StoreBusy("x".to_string()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), exit_codes::FAILURE);
        }
    }

    #[test]
    fn invalid_lock_name_is_quoted() {
        let err = ChmError::InvalidLockName("weird".to_string());
        assert_eq!(err.to_string(), "Invalid lock name 'weird'");
    }
}
