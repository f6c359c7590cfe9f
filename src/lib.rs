//! # esxguard - CIS hardening audits for VMware ESXi
//!
//! esxguard inspects ESXi 8 hosts over SSH, compares what it finds against the
//! CIS VMware ESXi 8 benchmark and, when asked, puts non-compliant settings
//! back in line. Every fact is read with an ordinary ESXi shell command
//! (`esxcli`, `vim-cmd`, `grep` on `.vmx` files) and parsed from text.
//!
//! ## Core Concepts
//!
//! - **Connections**: one SSH session per command, behind the [`Connection`](connection::Connection) trait
//! - **Parsers**: free-text command output to typed facts, `None` when absent
//! - **Rules**: a check and a remediation per benchmark rule id
//! - **Registry**: the ordered, immutable table of rule ids
//! - **Auditor**: walks hosts and rules in sequence and collects verdicts
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CLI Interface                        │
//! │        (clap commands, dialoguer prompts, output)         │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Auditor                           │
//! │          (hosts x rules, verdicts, remediation)           │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!          ┌──────────────────┼──────────────────┐
//!          ▼                  ▼                  ▼
//! ┌─────────────────┐ ┌───────────────┐ ┌─────────────────┐
//! │  Rule Registry  │ │    Policy     │ │     Parsers     │
//! └─────────────────┘ └───────────────┘ └─────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                 SSH Executor (russh)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use esxguard::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load(None)?;
//!     let target = HostConfig::new("10.0.0.5")
//!         .to_target(&config.defaults, Credentials::password("secret"))?;
//!     let executor = SshExecutor::new(target, config.defaults.clone());
//!
//!     let registry = Arc::new(RuleRegistry::esxi8());
//!     let auditor = Auditor::new(registry.clone(), config.benchmark.clone());
//!     let (rules, _) = registry.resolve("");
//!
//!     let report = auditor
//!         .audit_host("10.0.0.5", &executor, &rules, &SilentEvents)
//!         .await;
//!     println!("{} passed, {} failed", report.passed(), report.failed());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Connection types
    #[cfg(feature = "russh")]
    pub use crate::connection::{RusshConnection, SshExecutor};
    pub use crate::connection::{
        CommandResult, Connection, ConnectionDefaults, ConnectionError, ConnectionResult,
        Credentials, ExecuteOptions, HostConfig, HostTarget,
    };

    // Error handling
    pub use crate::error::{Error, Result};

    // Benchmark
    pub use crate::benchmark::{
        BenchmarkError, BenchmarkSettings, Detail, Operator, RemediationOutcome, Rule,
        RuleRegistry, Verdict,
    };

    // Orchestration
    pub use crate::audit::{AuditEvents, AuditReport, Auditor, HostReport, SilentEvents};

    // Configuration
    pub use crate::config::Config;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases for esxguard operations.
///
/// The crate-level [`Error`](error::Error) wraps the transport and remediation
/// errors and maps each failure class to a process exit code.
pub mod error;

/// Configuration loading and merging.
pub mod config;

// ============================================================================
// Infrastructure
// ============================================================================

/// Connection layer for remote host communication.
///
/// This module provides the [`Connection`](connection::Connection) trait, the
/// credential and target types, and the russh-backed per-command executor.
pub mod connection;

// ============================================================================
// Benchmark
// ============================================================================

/// The CIS VMware ESXi 8 benchmark: parsers, policy, rules and registry.
pub mod benchmark;

/// Audit orchestration and reports.
///
/// The [`Auditor`](audit::Auditor) runs the selected rules against each host in
/// turn, records transport failures per host, and applies fixes the operator
/// picks.
pub mod audit;
