//! Reconciliation events with structured tracing

use std::fmt;

/// Events emitted while converging a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// A step's command ran and succeeded
    StepApplied {
        /// Step description
        step: String,
    },

    /// A step's guard said the work is already done
    StepSkipped {
        /// Step description
        step: String,
        /// Why it was skipped
        reason: String,
    },

    /// A step failed but its policy tolerates failure
    StepTolerated {
        /// Step description
        step: String,
        /// Exit status description
        status: String,
    },

    /// The interface was not found; nothing was changed
    PreconditionFailed {
        /// Interface name
        interface: String,
    },

    /// Converge finished
    Converged {
        /// Namespace name
        namespace: String,
        /// Whether the namespace was recreated
        forced: bool,
    },
}

impl ReconcileEvent {
    /// Emit structured tracing event
    pub fn emit_trace(&self) {
        match self {
            Self::StepApplied { step } => {
                tracing::debug!(step = %step, "Step applied");
            }
            Self::StepSkipped { step, reason } => {
                tracing::info!(step = %step, "{reason}, skipping.");
            }
            Self::StepTolerated { step, status } => {
                tracing::warn!(step = %step, status = %status, "Step failed, continuing");
            }
            Self::PreconditionFailed { interface } => {
                tracing::error!(interface = %interface, "Interface not found");
            }
            Self::Converged { namespace, forced } => {
                tracing::info!(namespace = %namespace, forced = forced, "Namespace converged");
            }
        }
    }
}

impl fmt::Display for ReconcileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepApplied { step } => write!(f, "applied: {step}"),
            Self::StepSkipped { step, reason } => write!(f, "skipped: {step} ({reason})"),
            Self::StepTolerated { step, status } => write!(f, "tolerated: {step} ({status})"),
            Self::PreconditionFailed { interface } => {
                write!(f, "precondition failed: interface '{interface}' not found")
            }
            Self::Converged { namespace, forced } => {
                write!(f, "converged: {namespace}")?;
                if *forced {
                    write!(f, " (recreated)")?;
                }
                Ok(())
            }
        }
    }
}
