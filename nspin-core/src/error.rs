//! Error types for nspin

use std::path::PathBuf;
use thiserror::Error;

/// nspin error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The interface is not visible anywhere; nothing can be reconciled
    #[error(
        "Interface '{interface}' not found in {}. Please create the interface first.",
        lookup_scope(.namespace.as_deref())
    )]
    InterfaceMissing {
        /// Interface that was looked up
        interface: String,
        /// Namespace it was looked up in, `None` for the root namespace
        namespace: Option<String>,
    },

    /// A command whose failure must propagate exited non-zero
    #[error("Command failed ({status}): {command}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit status description
        status: String,
    },

    /// A command could not be launched at all
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying launch error
        #[source]
        source: std::io::Error,
    },

    /// Permission denied
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Config file {}: {message}", .path.display())]
    Config {
        /// Path of the file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Another invocation holds the lock for this namespace
    #[error("Another nspin invocation holds {}", .path.display())]
    Locked {
        /// Lock file path
        path: PathBuf,
    },

    /// System error from nix
    #[error("System error: {0}")]
    System(#[from] nix::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

fn lookup_scope(namespace: Option<&str>) -> String {
    namespace.map_or_else(
        || "the root namespace".to_string(),
        |ns| format!("namespace '{ns}'"),
    )
}

/// Result type alias for nspin operations
pub type Result<T> = std::result::Result<T, Error>;
