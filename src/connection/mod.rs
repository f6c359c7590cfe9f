//! Connection layer for remote host communication.
//!
//! The benchmark rules never talk to SSH directly. They go through the
//! [`Connection`] trait, whose single operation runs one command string and
//! hands back the captured stdout and stderr as text.
//!
//! # Transports
//!
//! - [`RusshConnection`]: one authenticated SSH session (pure Rust, `russh`).
//! - [`SshExecutor`]: opens a fresh [`RusshConnection`] for every command and
//!   closes it again once the output has been read, whatever the outcome.
//!
//! # Example
//!
//! ```rust,ignore
//! use esxguard::connection::{Connection, Credentials, HostTarget, SshExecutor};
//! use esxguard::connection::config::ConnectionDefaults;
//!
//! let target = HostTarget::new("10.0.0.5", "root", Credentials::password("secret"));
//! let executor = SshExecutor::new(target, ConnectionDefaults::default());
//!
//! let result = executor.execute("esxcli software acceptance get", None).await?;
//! println!("{}", result.stdout);
//! ```

/// Connection configuration types.
pub mod config;

/// Per-command SSH executor.
#[cfg(feature = "russh")]
pub mod executor;

/// Pure Rust SSH implementation using russh.
#[cfg(feature = "russh")]
pub mod russh;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use config::{ConnectionDefaults, HostConfig};
#[cfg(feature = "russh")]
pub use executor::SshExecutor;
#[cfg(feature = "russh")]
pub use russh::RusshConnection;

/// Russh-related error type - wraps russh::Error for compatibility with the Handler trait
#[cfg(feature = "russh")]
#[derive(Debug)]
pub struct RusshError(pub ::russh::Error);

#[cfg(feature = "russh")]
impl From<::russh::Error> for RusshError {
    fn from(err: ::russh::Error) -> Self {
        RusshError(err)
    }
}

#[cfg(feature = "russh")]
impl fmt::Display for RusshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Russh error: {}", self.0)
    }
}

#[cfg(feature = "russh")]
impl std::error::Error for RusshError {}

#[cfg(feature = "russh")]
impl From<::russh::Error> for ConnectionError {
    fn from(err: ::russh::Error) -> Self {
        ConnectionError::SshError(format!("Russh error: {}", err))
    }
}

/// Errors that can occur while talking to a host.
///
/// Every variant is a transport failure. Output that could not be understood
/// is never reported here; parsers turn it into an absent fact instead.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish initial connection to the host.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication was rejected by the remote host.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server's host key did not pass known_hosts verification.
    #[error("Host key verification failed for {0}")]
    HostKeyRejected(String),

    /// Command execution failed (not to be confused with non-zero exit code).
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Connection or command timed out.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SSH-specific error from the underlying implementation.
    #[error("SSH error: {0}")]
    SshError(String),

    /// I/O error during connection operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Connection was closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// The result of executing a command on a connection.
///
/// # Example
///
/// ```rust
/// use esxguard::connection::CommandResult;
///
/// let result = CommandResult::success("VMwareCertified\n".into(), String::new());
/// assert!(result.success);
/// assert_eq!(result.exit_code, 0);
///
/// let failed = CommandResult::failure(1, String::new(), String::new());
/// assert!(!failed.success);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code of the command (0 typically indicates success).
    pub exit_code: i32,
    /// Content written to standard output.
    pub stdout: String,
    /// Content written to standard error.
    pub stderr: String,
    /// Convenience flag: `true` if `exit_code == 0`.
    pub success: bool,
}

impl CommandResult {
    /// Create a new successful command result
    pub fn success(stdout: String, stderr: String) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr,
            success: true,
        }
    }

    /// Create a new failed command result
    pub fn failure(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: false,
        }
    }
}

/// Options for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Timeout in seconds (None for no timeout)
    pub timeout: Option<u64>,
}

impl ExecuteOptions {
    /// Create new execute options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How to authenticate against a host.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Password authentication.
    Password(String),
    /// Public key authentication with a private key file.
    PrivateKey {
        /// Path to the private key (may contain `~` or environment variables)
        path: PathBuf,
        /// Passphrase for an encrypted key
        passphrase: Option<String>,
    },
    /// Identities held by a running ssh-agent (`SSH_AUTH_SOCK`).
    Agent,
}

impl Credentials {
    /// Password credentials.
    pub fn password(password: impl Into<String>) -> Self {
        Credentials::Password(password.into())
    }

    /// Private key credentials.
    pub fn private_key(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Credentials::PrivateKey {
            path: path.into(),
            passphrase,
        }
    }

    /// Short name of the method, for logs.
    pub fn method(&self) -> &'static str {
        match self {
            Credentials::Password(_) => "password",
            Credentials::PrivateKey { .. } => "publickey",
            Credentials::Agent => "agent",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password(_) => f.write_str("Password(<redacted>)"),
            Credentials::PrivateKey { path, passphrase } => f
                .debug_struct("PrivateKey")
                .field("path", path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credentials::Agent => f.write_str("Agent"),
        }
    }
}

/// A host to audit, with everything needed to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    /// Hostname or IP address
    pub address: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Authentication method
    pub credentials: Credentials,
}

impl HostTarget {
    /// Create a target on the default SSH port.
    pub fn new(address: impl Into<String>, user: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            port: config::DEFAULT_PORT,
            user: user.into(),
            credentials,
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `user@address:port`
    pub fn identifier(&self) -> String {
        format!("{}@{}:{}", self.user, self.address, self.port)
    }
}

/// The transport contract the benchmark depends on.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the connection identifier (the host address)
    fn identifier(&self) -> &str;

    /// Execute a command on the remote host.
    ///
    /// A non-zero exit status or text on stderr is not an error: the result
    /// carries both and the caller decides.
    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult>;

    /// Close the connection
    async fn close(&self) -> ConnectionResult<()>;
}
