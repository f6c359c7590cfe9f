//! The rule abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::host::EsxHost;
use super::remediation::{Operator, RemediationOutcome};
use super::verdict::{Detail, Verdict};
use super::{BenchmarkResult, Section};
use crate::connection::{Connection, ConnectionResult};

/// Default vSwitch inspected by the network rules.
pub const DEFAULT_VSWITCH: &str = "vSwitch0";

/// Loghost offered when the operator gives no answer.
pub const DEFAULT_SYSLOG_EXAMPLE: &str = "tcp://192.168.1.10:514";

/// Site-specific knobs for the benchmark, the `[benchmark]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Standard vSwitch checked by 5.6 to 5.8
    pub vswitch: String,
    /// Default answer for the remote syslog prompt
    pub syslog_example: String,
    /// Per-command timeout override in seconds
    pub command_timeout: Option<u64>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            vswitch: DEFAULT_VSWITCH.to_string(),
            syslog_example: DEFAULT_SYSLOG_EXAMPLE.to_string(),
            command_timeout: None,
        }
    }
}

/// How a rule brings a host back into compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    /// One write with the canonical value, no questions asked
    Direct,
    /// The operator supplies the value
    OperatorInput,
    /// The operator picks which VMs to change
    PerVm,
}

impl fmt::Display for RemediationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationKind::Direct => write!(f, "direct"),
            RemediationKind::OperatorInput => write!(f, "operator input"),
            RemediationKind::PerVm => write!(f, "per VM"),
        }
    }
}

/// Everything a rule needs to inspect one host.
pub struct RuleContext<'a> {
    /// Host address, copied into every verdict
    pub host: &'a str,
    pub connection: &'a dyn Connection,
    pub settings: &'a BenchmarkSettings,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        host: &'a str,
        connection: &'a dyn Connection,
        settings: &'a BenchmarkSettings,
    ) -> Self {
        Self {
            host,
            connection,
            settings,
        }
    }

    /// Fact accessor for this host.
    pub fn esx(&self) -> EsxHost<'a> {
        EsxHost::new(self.connection, self.settings.command_timeout)
    }

    /// Verdict for `rule` on this host.
    pub fn verdict<R: Rule + ?Sized>(&self, rule: &R, passed: bool, detail: Detail) -> Verdict {
        Verdict::new(self.host, rule.id(), rule.title(), passed, detail)
    }
}

/// One benchmark rule: a read-only check and the matching fix.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Dotted benchmark id, e.g. `3.7`
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn section(&self) -> Section;

    fn remediation_kind(&self) -> RemediationKind;

    /// Inspect the host. Only transport failures are errors; anything the
    /// parsers cannot read yields a failing verdict.
    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict>;

    /// Bring the host into compliance.
    ///
    /// `previous` is the verdict from the audit pass, if any; rules that act
    /// on a list of offenders reuse it instead of querying again.
    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        previous: Option<&Verdict>,
        operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = BenchmarkSettings::default();
        assert_eq!(settings.vswitch, "vSwitch0");
        assert_eq!(settings.syslog_example, "tcp://192.168.1.10:514");
        assert_eq!(settings.command_timeout, None);
    }

    #[test]
    fn test_settings_partial_toml() {
        let settings: BenchmarkSettings = toml::from_str("vswitch = \"vSwitch1\"").unwrap();
        assert_eq!(settings.vswitch, "vSwitch1");
        assert_eq!(settings.syslog_example, DEFAULT_SYSLOG_EXAMPLE);
    }

    #[test]
    fn test_remediation_kind_display() {
        assert_eq!(RemediationKind::PerVm.to_string(), "per VM");
        assert_eq!(RemediationKind::OperatorInput.to_string(), "operator input");
    }
}
