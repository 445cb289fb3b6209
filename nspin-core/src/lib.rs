//! nspin Core - Foundation types, configuration, and events
//!
//! This crate provides the core abstractions shared by the reconciler,
//! the unit writer and the CLI.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use config::{DiagnosticsConfig, PathsConfig, Settings, TargetConfig, TargetOverrides};
pub use error::{Error, Result};
pub use events::ReconcileEvent;
pub use state::{InterfaceLocation, ObservedState};
pub use types::{CidrAddress, InterfaceName, NamespaceName};
