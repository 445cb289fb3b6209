//! Network namespace reconciliation
//!
//! This crate converges one network namespace towards its target state:
//! - Inspector - read-only existence queries against `ip`
//! - Executor - runs commands with a propagate/tolerate failure policy
//! - Reconciler - ordered, individually guarded mutation steps
//! - Diagnostics - reachability and throughput probes inside the namespace
//!
//! All OS access goes through [`CommandRunner`]; [`MockRunner`] simulates a
//! host so the whole sequence can be tested without root.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod diagnostics;
pub mod executor;
pub mod inspector;
pub mod ip;
pub mod mock;
pub mod reconciler;
pub mod runner;
pub mod step;

pub use diagnostics::{Diagnostics, ProbeResult, ReachabilityReport, ThroughputOutcome};
pub use executor::{Executor, FailurePolicy, Outcome};
pub use inspector::{Inspection, StateInspector};
pub use ip::Ip;
pub use mock::{MockCall, MockRunner, SimulatedHost};
pub use reconciler::{ConvergeReport, Reconciler};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, OutputMode, SystemRunner};
pub use step::{Check, Guard, Step};
