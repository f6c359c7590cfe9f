//! Configuration module for esxguard
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/esxguard/esxguard.toml)
//! - User configuration (~/.esxguard.toml, {config_dir}/esxguard/config.toml)
//! - Project configuration (./esxguard.toml)
//! - Environment variables
//!
//! An explicit path (`--config` or `ESXGUARD_CONFIG`) replaces the search.
//! Passwords are never read from configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::benchmark::BenchmarkSettings;
use crate::connection::config::expand_path;
use crate::connection::{ConnectionDefaults, HostConfig};
use crate::error::{Error, Result};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "ESXGUARD_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SSH settings shared by all hosts
    pub defaults: ConnectionDefaults,

    /// Benchmark knobs
    pub benchmark: BenchmarkSettings,

    /// Terminal output settings
    pub output: OutputConfig,

    /// Host inventory
    pub hosts: Vec<HostConfig>,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Enable colored output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        match Self::explicit_path(config_path) {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::InvalidConfig(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                config = config.merge_from_file(&path)?;
            }
            None => {
                for path in Self::search_paths() {
                    if path.exists() {
                        config = config.merge_from_file(&path)?;
                    }
                }
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn explicit_path(config_path: Option<&PathBuf>) -> Option<PathBuf> {
        config_path
            .cloned()
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(|p| expand_path(&p)))
    }

    /// Standard locations, lowest precedence first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/esxguard/esxguard.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".esxguard.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("esxguard").join("config.toml"));
        }

        paths.push(PathBuf::from("esxguard.toml"));
        paths
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration file");

        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .map_err(|e| Error::config_parse(path, e.to_string()))?,
            "json" => serde_json::from_str(&content)
                .map_err(|e| Error::config_parse(path, e.to_string()))?,
            "toml" => {
                toml::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))?
            }
            _ => {
                // Try TOML first, then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .map_err(|e| Error::config_parse(path, e.to_string()))?
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one. Values in `other` that differ
    /// from the built-in defaults win.
    fn merge(&self, other: Config) -> Config {
        let base = ConnectionDefaults::default();
        let bench = BenchmarkSettings::default();

        Config {
            defaults: ConnectionDefaults {
                user: if other.defaults.user != base.user {
                    other.defaults.user
                } else {
                    self.defaults.user.clone()
                },
                port: if other.defaults.port != base.port {
                    other.defaults.port
                } else {
                    self.defaults.port
                },
                connect_timeout: if other.defaults.connect_timeout != base.connect_timeout {
                    other.defaults.connect_timeout
                } else {
                    self.defaults.connect_timeout
                },
                command_timeout: if other.defaults.command_timeout != base.command_timeout {
                    other.defaults.command_timeout
                } else {
                    self.defaults.command_timeout
                },
                identity_file: other
                    .defaults
                    .identity_file
                    .or_else(|| self.defaults.identity_file.clone()),
                strict_host_key_checking: other.defaults.strict_host_key_checking
                    || self.defaults.strict_host_key_checking,
                known_hosts_file: other
                    .defaults
                    .known_hosts_file
                    .or_else(|| self.defaults.known_hosts_file.clone()),
            },
            benchmark: BenchmarkSettings {
                vswitch: if other.benchmark.vswitch != bench.vswitch {
                    other.benchmark.vswitch
                } else {
                    self.benchmark.vswitch.clone()
                },
                syslog_example: if other.benchmark.syslog_example != bench.syslog_example {
                    other.benchmark.syslog_example
                } else {
                    self.benchmark.syslog_example.clone()
                },
                command_timeout: other
                    .benchmark
                    .command_timeout
                    .or(self.benchmark.command_timeout),
            },
            output: OutputConfig {
                color: other.output.color && self.output.color,
            },
            hosts: if other.hosts.is_empty() {
                self.hosts.clone()
            } else {
                other.hosts
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // ESXGUARD_USER
        if let Ok(user) = std::env::var("ESXGUARD_USER") {
            self.defaults.user = user;
        }

        // ESXGUARD_TIMEOUT
        if let Ok(timeout) = std::env::var("ESXGUARD_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.defaults.command_timeout = n;
            }
        }

        // ESXGUARD_VSWITCH
        if let Ok(vswitch) = std::env::var("ESXGUARD_VSWITCH") {
            self.benchmark.vswitch = vswitch;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = false;
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.user.trim().is_empty() {
            return Err(Error::InvalidConfig("defaults.user is empty".to_string()));
        }
        if self.defaults.connect_timeout == 0 || self.defaults.command_timeout == 0 {
            return Err(Error::InvalidConfig(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.benchmark.vswitch.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "benchmark.vswitch is empty".to_string(),
            ));
        }
        if let Some(host) = self.hosts.iter().find(|h| h.address.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "host entry without an address (user {:?})",
                host.user
            )));
        }
        Ok(())
    }
}
