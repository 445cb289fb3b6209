//! Privileged command execution with per-command failure policy

use nspin_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::runner::{CommandOutput, CommandRunner, CommandSpec, OutputMode};

/// What happens when a command fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// A failure aborts the current action
    Propagate,
    /// A failure is logged and execution continues
    Tolerate,
}

/// Outcome of a command that did not abort the action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exited 0
    Succeeded,
    /// Failed under [`FailurePolicy::Tolerate`]; carries the status description
    Tolerated(String),
}

/// Runs commands through a [`CommandRunner`], narrating each one
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
}

impl Executor {
    /// Create an executor over a runner
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run a command with its output streamed to the operator
    ///
    /// # Errors
    /// Under [`FailurePolicy::Propagate`], returns [`Error::CommandFailed`]
    /// on non-zero exit and [`Error::Spawn`] if the command cannot start
    pub async fn run(&self, command: &CommandSpec, policy: FailurePolicy) -> Result<Outcome> {
        info!("Running: {command}");

        let failure = match self.runner.run(command, OutputMode::Stream).await {
            Ok(output) if output.success() => return Ok(Outcome::Succeeded),
            Ok(output) => Error::CommandFailed {
                command: command.to_string(),
                status: output.status_description(),
            },
            Err(e) => e,
        };

        match policy {
            FailurePolicy::Propagate => Err(failure),
            FailurePolicy::Tolerate => {
                warn!("Ignoring failure: {failure}");
                let status = match failure {
                    Error::CommandFailed { status, .. } => status,
                    other => other.to_string(),
                };
                Ok(Outcome::Tolerated(status))
            }
        }
    }

    /// Run a read-only query quietly and hand back its output
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the command cannot start; a non-zero exit
    /// is not an error
    pub async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = self.runner.run(command, OutputMode::Capture).await?;
        let stderr = output.stderr_string();
        debug!(
            command = %command,
            status = %output.status_description(),
            stderr = stderr.trim(),
            "Query finished"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}
