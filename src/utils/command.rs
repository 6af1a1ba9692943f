//! Command execution utilities
//!
//! Runs the external tools the collaborator bindings drive (`git`, `gh`)
//! with captured output, so callers can turn a failure into a typed error
//! carrying stderr.

use std::path::Path;
use std::process::Command;

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code of the command, -1 if it was killed by a signal
    pub exit_code: i32,
    /// Standard output, trimmed
    pub stdout: String,
    /// Standard error, trimmed
    pub stderr: String,
}

impl CommandResult {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Execute a command and capture its output
///
/// # Arguments
/// * `program` - The program to execute
/// * `args` - Arguments to pass to the program
/// * `working_dir` - Optional working directory
///
/// # Errors
/// Returns the I/O error if the command could not be started. A command
/// that starts and exits non-zero is reported through
/// [`CommandResult::success`] instead.
pub fn execute_command(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
) -> std::io::Result<CommandResult> {
    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    // Never block on a credential or editor prompt in CI
    cmd.env("GIT_TERMINAL_PROMPT", "0").env("GH_PROMPT_DISABLED", "1");

    let output = cmd.output()?;

    Ok(CommandResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
