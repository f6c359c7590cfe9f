//! CLI module for esxguard
//!
//! This module provides the command-line interface for esxguard,
//! including argument parsing, prompts, output and subcommand handling.

pub mod commands;
pub mod interactive;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// esxguard - CIS hardening audits for VMware ESXi
///
/// Checks ESXi 8 hosts over SSH against the CIS benchmark and fixes what fails.
#[derive(Parser, Debug, Clone)]
#[command(name = "esxguard")]
#[command(author = "esxguard Contributors")]
#[command(version)]
#[command(about = "Audit and remediate CIS hardening settings on VMware ESXi hosts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "ESXGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log line format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// One JSON report at the end of the run
    Json,
}

/// Format of the log lines written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Audit hosts against the benchmark and optionally fix failures
    Audit(commands::audit::AuditArgs),

    /// List the benchmark rules
    Rules(commands::rules::RulesArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}
