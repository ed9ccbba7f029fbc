//! Exit code constants for the chm CLI.
//!
//! - 0: the requested action succeeded
//! - 1: anything else (denied lock, bad arguments, I/O or git failure)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// The action was refused or failed.
pub const FAILURE: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(SUCCESS, FAILURE);
    }

    #[test]
    fn exit_codes_match_cli_contract() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(FAILURE, 1);
    }
}
