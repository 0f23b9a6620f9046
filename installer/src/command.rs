//! External command execution.
//!
//! Installer steps that shell out (`gpg`, `xar`, `tar`, `xcrun`, `swift`)
//! go through [`CommandExecutor`] so tests can replay canned output.

use crate::error::{Result, SetupError};
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use setup_swift::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("gpg", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), setup_swift::error::SetupError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(|source| SetupError::Command {
                program: cmd.to_owned(),
                message: format!("failed to start: {source}"),
            })
    }
}

/// Run a command and fail unless it exits successfully.
///
/// # Errors
///
/// Returns [`SetupError::Command`] carrying the trimmed stderr when the
/// command exits with a non-zero status.
pub fn run_checked(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> Result<Output> {
    let output = executor.run(cmd, args)?;
    if output.status.success() {
        return Ok(output);
    }
    Err(SetupError::Command {
        program: cmd.to_owned(),
        message: format!("exited with {}: {}", output.status, stderr_message(&output)),
    })
}

/// Return the trimmed stderr of `output`, or a placeholder when empty.
#[must_use]
pub fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        "unknown error".to_owned()
    } else {
        trimmed.to_owned()
    }
}
