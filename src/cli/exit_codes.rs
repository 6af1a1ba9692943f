//! Exit codes for the action
//!
//! GitHub marks a step as failed on any non-zero exit code. The codes below
//! let a workflow tell a policy failure apart from a broken run.
//!
//! # Exit Code Reference
//!
//! | Code | Constant | Meaning | Example |
//! |------|----------|---------|---------|
//! | 0 | `SUCCESS` | Success | Nothing to pin, or pull request opened |
//! | 1 | `UNPINNED_FOUND` | Unpinned references | `fail_on_unpinned` with modifications |
//! | 3 | `ERROR` | Runtime error | Push rejected, API unreachable |
//! | 4 | `INVALID_ARGS` | Initialization error | Missing `GITHUB_REPOSITORY`, conflicting inputs |
//!
//! # Usage
//!
//! ```rust,ignore
//! use frizbee_action::cli::exit_codes;
//!
//! std::process::exit(exit_codes::UNPINNED_FOUND);
//! ```

/// Success - the run completed and the policy does not fail it.
///
/// Used when:
/// - No files were processed
/// - Nothing needed pinning
/// - Modifications were published, or reported only
pub const SUCCESS: i32 = 0;

/// Unpinned actions or container images were found.
///
/// Used when:
/// - `fail_on_unpinned` is set and a scan modified at least one file,
///   after any requested pull request was opened
pub const UNPINNED_FOUND: i32 = 1;

/// Runtime error (scan, write, git or API failure).
///
/// Used when:
/// - A configured path does not exist
/// - A file could not be written or staged
/// - Commit or push failed
/// - The hosting API refused a request
pub const ERROR: i32 = 3;

/// Initialization error (missing or conflicting inputs).
///
/// Used when:
/// - Required `GITHUB_*` variables are not set
/// - `INPUT_ACTIONS` and `INPUT_ACTIONS_PATHS` are both set
/// - The repository root is not a git repository
pub const INVALID_ARGS: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [SUCCESS, UNPINNED_FOUND, ERROR, INVALID_ARGS];
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                assert_ne!(
                    codes[i], codes[j],
                    "Exit codes should be unique: {} and {} are both {}",
                    i, j, codes[i]
                );
            }
        }
    }

    #[test]
    fn test_exit_codes_values() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(UNPINNED_FOUND, 1);
        assert_eq!(ERROR, 3);
        assert_eq!(INVALID_ARGS, 4);
    }
}
