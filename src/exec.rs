//! External command execution.
//!
//! Everything the engine runs on the host (asterisk playback, DTMF
//! dispatch, user trigger scripts) goes through [`CommandRunner`] so tests
//! can record commands instead of executing them.

use crate::error::{AlertError, Result};
use tracing::{debug, warn};

/// Runs host commands through the shell.
pub trait CommandRunner {
    /// Run one command line through the shell.
    ///
    /// A nonzero exit status is logged, not an error; only a failure to
    /// spawn the shell at all is.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned.
    fn run_shell(&self, command: &str) -> Result<()>;
}

/// [`CommandRunner`] backed by `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run_shell(&self, command: &str) -> Result<()> {
        debug!("exec: {command}");
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|e| AlertError::Exec(format!("cannot run '{command}': {e}")))?;

        if !status.success() {
            warn!("exec: '{command}' exited with {status}");
        }
        Ok(())
    }
}
