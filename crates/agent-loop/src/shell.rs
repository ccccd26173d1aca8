//! Shell command execution

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{AgentError, Result};

/// Runs command strings through a fixed shell interpreter.
///
/// The command is passed to `<shell> -c` so shell metacharacters keep
/// their meaning, and the parent process environment is forwarded. There
/// is no timeout: a hung command blocks its run until the process exits.
pub struct ShellExecutor {
    shell: PathBuf,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run a command, returning captured stdout.
    ///
    /// Anything on the error stream fails the call, even when the exit
    /// code is zero. Tools that write informational text to stderr are a
    /// known source of false negatives under this policy.
    pub async fn run(&self, command: &str) -> Result<String> {
        debug!("Running {:?} -c {:?}", self.shell, command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                AgentError::command(format!("failed to launch {}: {e}", self.shell.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !stderr.is_empty() {
            return Err(AgentError::command(stderr.trim_end().to_string()));
        }

        if !output.status.success() {
            return Err(AgentError::command(format!(
                "exited with status {}",
                output.status
            )));
        }

        Ok(stdout)
    }
}
