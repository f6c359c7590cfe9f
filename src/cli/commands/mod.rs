//! Subcommands module for esxguard CLI
//!
//! This module contains all the subcommand implementations.

pub mod audit;
pub mod rules;

use std::sync::Arc;

use crate::cli::output::OutputFormatter;
use esxguard::benchmark::RuleRegistry;
use esxguard::config::Config;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Rule table, built once
    pub registry: Arc<RuleRegistry>,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, mut config: Config) -> Self {
        if let Some(timeout) = cli.timeout {
            config.defaults.command_timeout = timeout;
        }

        let output = OutputFormatter::new(
            !cli.no_color && config.output.color,
            cli.is_json(),
            cli.verbosity(),
        );

        Self {
            config,
            output,
            registry: Arc::new(RuleRegistry::esxi8()),
        }
    }
}
