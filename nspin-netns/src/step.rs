//! Guarded mutation steps

use std::fmt;

use crate::executor::FailurePolicy;
use crate::runner::CommandSpec;

/// A condition evaluated against the host just before a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Target namespace is listed
    NamespaceExists,
    /// Interface is inside the target namespace
    InterfaceInNamespace,
    /// Target address is on the interface
    AddressAssigned,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceExists => write!(f, "namespace exists"),
            Self::InterfaceInNamespace => write!(f, "interface in namespace"),
            Self::AddressAssigned => write!(f, "address assigned"),
        }
    }
}

/// When a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Unconditionally; the command is idempotent at the OS level
    Always,
    /// Only if the check holds
    If(Check),
    /// Only if the check does not hold
    Unless(Check),
}

impl Guard {
    /// Check this guard depends on, if any
    #[must_use]
    pub const fn check(self) -> Option<Check> {
        match self {
            Self::Always => None,
            Self::If(check) | Self::Unless(check) => Some(check),
        }
    }

    /// Whether the step should run given the check's value
    #[must_use]
    pub const fn admits(self, holds: bool) -> bool {
        match self {
            Self::Always => true,
            Self::If(_) => holds,
            Self::Unless(_) => !holds,
        }
    }
}

/// One idempotent mutation in a converge sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Section header the step is narrated under
    pub section: &'static str,
    /// What the step does
    pub description: String,
    /// Command issued when the guard admits the step
    pub command: CommandSpec,
    /// Condition for running
    pub guard: Guard,
    /// What a failure does to the sequence
    pub policy: FailurePolicy,
    /// Logged when the guard skips the step
    pub skip_note: String,
}

impl Step {
    /// Create an unconditional, propagating step
    pub fn new(section: &'static str, description: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            section,
            description: description.into(),
            command,
            guard: Guard::Always,
            policy: FailurePolicy::Propagate,
            skip_note: String::new(),
        }
    }

    /// Run only if `check` holds
    #[must_use]
    pub fn only_if(mut self, check: Check, skip_note: impl Into<String>) -> Self {
        self.guard = Guard::If(check);
        self.skip_note = skip_note.into();
        self
    }

    /// Run only if `check` does not hold
    #[must_use]
    pub fn unless(mut self, check: Check, skip_note: impl Into<String>) -> Self {
        self.guard = Guard::Unless(check);
        self.skip_note = skip_note.into();
        self
    }

    /// Log failures instead of propagating them
    #[must_use]
    pub const fn tolerate_failure(mut self) -> Self {
        self.policy = FailurePolicy::Tolerate;
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)?;
        match self.guard {
            Guard::Always => {}
            Guard::If(check) => write!(f, " [if {check}]")?,
            Guard::Unless(check) => write!(f, " [unless {check}]")?,
        }
        if self.policy == FailurePolicy::Tolerate {
            write!(f, " [failure tolerated]")?;
        }
        Ok(())
    }
}
