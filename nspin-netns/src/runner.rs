//! Command runner trait for pluggable implementations

use async_trait::async_trait;
use nspin_core::{Error, Result};
use std::fmt;
use std::process::Stdio;

/// An external command as program plus arguments, never a shell string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    /// Program name or absolute path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program followed by arguments
    #[must_use]
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// How a command's output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout/stderr for parsing; nothing reaches the terminal
    Capture,
    /// Inherit the terminal so the operator sees the command's own output
    Stream,
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty when streamed)
    pub stdout: Vec<u8>,
    /// Captured stderr (empty when streamed)
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// A successful, silent result
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            code: Some(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    /// Exit code 0
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Get stdout as string (lossy)
    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as string (lossy)
    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Human-readable exit status
    #[must_use]
    pub fn status_description(&self) -> String {
        self.code.map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exit status {code}"),
        )
    }
}

/// Trait for command execution backends
///
/// This allows for different implementations:
/// - [`SystemRunner`] - Spawns real processes
/// - [`MockRunner`](crate::MockRunner) - Simulated host for testing
///
/// A non-zero exit is reported through [`CommandOutput::code`], not as an
/// error. `Err` means the command could not be launched at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the process could not be started
    async fn run(&self, command: &CommandSpec, mode: OutputMode) -> Result<CommandOutput>;
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec, mode: OutputMode) -> Result<CommandOutput> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());

        let spawn_error = |source| Error::Spawn {
            command: command.to_string(),
            source,
        };

        match mode {
            OutputMode::Capture => {
                // Parsed output must not be localized
                cmd.env("LC_ALL", "C")
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());

                let output = cmd.output().await.map_err(spawn_error)?;

                tracing::trace!(
                    command = %command,
                    code = ?output.status.code(),
                    "Captured command finished"
                );

                Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            OutputMode::Stream => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());

                let status = cmd.status().await.map_err(spawn_error)?;

                Ok(CommandOutput {
                    code: status.code(),
                    ..CommandOutput::default()
                })
            }
        }
    }
}
