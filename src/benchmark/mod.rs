//! CIS VMware ESXi 8 benchmark.
//!
//! This module turns command output into verdicts and applies fixes:
//!
//! - [`parsers`]: raw text to typed facts (`Option<T>`, `None` when absent)
//! - [`policy`]: thresholds and compliance predicates
//! - [`EsxHost`]: typed fact accessors over a [`Connection`](crate::connection::Connection)
//! - [`rules`]: one evaluator/remediation pair per benchmark rule
//! - [`RuleRegistry`]: the ordered, immutable rule table
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use esxguard::benchmark::{BenchmarkSettings, RuleContext, RuleRegistry};
//!
//! let registry = RuleRegistry::esxi8();
//! let settings = BenchmarkSettings::default();
//! let ctx = RuleContext::new("10.0.0.5", &connection, &settings);
//!
//! for entry in registry.entries() {
//!     let verdict = entry.rule.check(&ctx).await?;
//!     println!("{} {}: {}", entry.id, verdict.title, if verdict.passed { "PASS" } else { "FAIL" });
//! }
//! ```

pub mod commands;
pub mod facts;
pub mod host;
pub mod parsers;
pub mod policy;
pub mod registry;
pub mod remediation;
pub mod rule;
pub mod rules;
pub mod verdict;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::connection::ConnectionError;

pub use facts::{PortGroup, Vib, VmDescriptor};
pub use host::{EsxHost, SecurityFlag};
pub use registry::{RuleEntry, RuleRegistry};
pub use remediation::{Operator, RemediationOutcome};
pub use rule::{BenchmarkSettings, RemediationKind, Rule, RuleContext};
pub use verdict::{Detail, Verdict};

/// Errors raised while remediating a host.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// Transport failure talking to the host.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A write command exited non-zero.
    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandRejected {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The operator prompt could not be shown or read.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl BenchmarkError {
    /// True for failures reaching the host at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, BenchmarkError::Connection(_))
    }
}

/// Result type for remediation operations
pub type BenchmarkResult<T> = Result<T, BenchmarkError>;

/// Benchmark chapter a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// 2.x: image profile and base settings
    Base,
    /// 3.x: management access
    Management,
    /// 4.x: logging
    Logging,
    /// 5.x: virtual networking
    Network,
    /// 7.x: virtual machine configuration
    VirtualMachine,
}

impl Section {
    /// Section for a dotted rule id such as `3.12`.
    pub fn from_rule_id(id: &str) -> Option<Self> {
        match id.split('.').next()? {
            "2" => Some(Section::Base),
            "3" => Some(Section::Management),
            "4" => Some(Section::Logging),
            "5" => Some(Section::Network),
            "7" => Some(Section::VirtualMachine),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Section::Base => 2,
            Section::Management => 3,
            Section::Logging => 4,
            Section::Network => 5,
            Section::VirtualMachine => 7,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Base => write!(f, "Base"),
            Section::Management => write!(f, "Management"),
            Section::Logging => write!(f, "Logging"),
            Section::Network => write!(f, "Network"),
            Section::VirtualMachine => write!(f, "Virtual Machine"),
        }
    }
}
