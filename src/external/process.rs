//! External command execution
//!
//! This module runs the programs behind command checks (compilers,
//! formatters, test runners) with a bounded, cancellable timeout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Reasons a command produced no [`CommandOutput`]
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Command not found: {program}")]
    NotFound { program: String },

    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    #[error("I/O error while running {program}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs an external command to completion or until its timeout expires
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    /// Commands run inside `working_dir`, which also anchors relative program paths
    pub fn new(working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError> {
        let program = which::which_in(command, std::env::var_os("PATH"), &self.working_dir)
            .map_err(|_| ExecError::NotFound {
                program: command.to_string(),
            })?;

        tracing::debug!("Running {} {:?} (timeout {:?})", program.display(), args, timeout);

        let child = Command::new(&program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Launch {
                program: command.to_string(),
                source,
            })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(source)) => Err(ExecError::Io {
                program: command.to_string(),
                source,
            }),
            Err(_) => {
                tracing::warn!("{} exceeded its {:?} timeout, killing it", command, timeout);
                Err(ExecError::Timeout {
                    program: command.to_string(),
                    timeout,
                })
            }
        }
    }
}
