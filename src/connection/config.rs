//! Connection configuration module
//!
//! Default SSH settings shared by every host, the per-host inventory entries
//! read from the configuration file, and path helpers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::{ConnectionError, Credentials, HostTarget};

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default user on ESXi hosts
pub const DEFAULT_USER: &str = "root";

/// Default connection (TCP + handshake) timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default per-command timeout in seconds
pub const DEFAULT_COMMAND_TIMEOUT: u64 = 60;

/// Default private key offered when key authentication is chosen interactively
pub const DEFAULT_IDENTITY_FILE: &str = "~/.ssh/id_rsa";

/// Default connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    /// Default username for connections
    #[serde(default = "default_user")]
    pub user: String,

    /// Default port for SSH connections
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Per-command timeout in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    /// Private key used when a host does not name one
    #[serde(default)]
    pub identity_file: Option<String>,

    /// Reject hosts missing from known_hosts
    #[serde(default)]
    pub strict_host_key_checking: bool,

    /// Known hosts file path (default: ~/.ssh/known_hosts)
    #[serde(default)]
    pub known_hosts_file: Option<String>,
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            user: default_user(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            identity_file: None,
            strict_host_key_checking: false,
            known_hosts_file: None,
        }
    }
}

impl ConnectionDefaults {
    /// Get the connection timeout as Duration
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Resolved known_hosts path
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        match &self.known_hosts_file {
            Some(path) => Some(expand_path(path)),
            None => dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")),
        }
    }
}

/// One inventory entry from the `[[hosts]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP address
    pub address: String,

    /// Port to connect to
    pub port: Option<u16>,

    /// Username for authentication
    pub user: Option<String>,

    /// Path to private key file
    pub identity_file: Option<String>,

    /// Authenticate through ssh-agent
    #[serde(default)]
    pub use_agent: bool,
}

impl HostConfig {
    /// Create a new host config
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set identity file
    pub fn identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// The key file to use, falling back to the defaults.
    pub fn effective_identity_file<'a>(&'a self, defaults: &'a ConnectionDefaults) -> Option<&'a str> {
        self.identity_file
            .as_deref()
            .or(defaults.identity_file.as_deref())
    }

    /// Build a target with the given credentials, merging in the defaults.
    pub fn to_target(
        &self,
        defaults: &ConnectionDefaults,
        credentials: Credentials,
    ) -> Result<HostTarget, ConnectionError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "host entry without an address".to_string(),
            ));
        }

        Ok(HostTarget {
            address: address.to_string(),
            port: self.port.unwrap_or(defaults.port),
            user: self.user.clone().unwrap_or_else(|| defaults.user.clone()),
            credentials,
        })
    }
}

/// Helper to expand paths with ~ and environment variables
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or_else(|_| path.into());
    PathBuf::from(expanded.as_ref())
}

/// Get default identity files to try
pub fn default_identity_files() -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    let ssh_dir = home.join(".ssh");

    vec![
        ssh_dir.join("id_rsa"),
        ssh_dir.join("id_ed25519"),
        ssh_dir.join("id_ecdsa"),
    ]
    .into_iter()
    .filter(|p| p.exists())
    .collect()
}
