//! Boot-time persistence through a systemd one-shot unit
//!
//! The unit replays the same `ip` commands the reconciler issues, so a host
//! that reboots comes back with the namespace in place.
//!
//! - [`UnitFile`] - deterministic rendering of the unit
//! - [`UnitManager`] - install, remove, query and restart the unit

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod manager;
pub mod unit;

pub use manager::{InstallOutcome, UnitManager};
pub use unit::{UnitFile, unit_name};

/// Program used to drive systemd
pub const SYSTEMCTL: &str = "systemctl";
