//! Error types for esxguard.
//!
//! Each layer owns a focused error enum ([`ConnectionError`] for the SSH
//! transport, [`BenchmarkError`](crate::benchmark::BenchmarkError) for rule
//! remediation). Per-host failures during an audit end up in the report; the
//! crate-level [`Error`] covers what stops a run before any host is contacted,
//! and maps each failure class to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::connection::ConnectionError;

/// Result type alias for esxguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for esxguard.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A configuration file exists but could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The merged configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Benchmark Errors
    // ========================================================================
    /// A rule id that is not part of the registry was requested.
    #[error("Unknown rule '{0}'")]
    UnknownRule(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// A host target could not be built or reached.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl Error {
    /// Creates a new config parse error.
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from the remote side rather than from
    /// local configuration.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Connection(e) if !matches!(e, ConnectionError::InvalidConfig(_))
        )
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        if self.is_transport() {
            3
        } else {
            1
        }
    }
}
