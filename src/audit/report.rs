//! Audit results and summary statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::benchmark::{RemediationOutcome, RuleRegistry, Verdict};

/// Everything learned about one host.
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: String,
    /// Verdicts in evaluation order
    pub verdicts: Vec<Verdict>,
    /// Transport error that stopped the audit of this host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostReport {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            verdicts: Vec::new(),
            error: None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.error.is_some()
    }

    pub fn verdict(&self, rule_id: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.rule_id == rule_id)
    }

    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts.iter().filter(|v| !v.passed).count()
    }

    pub fn unreadable(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_unreadable()).count()
    }

    pub fn failed_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.verdicts
            .iter()
            .filter(|v| !v.passed)
            .map(|v| v.rule_id.as_str())
    }
}

/// Result of one remediation attempt on one host.
#[derive(Debug, Clone, Serialize)]
pub struct FixRecord {
    pub host: String,
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RemediationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the fix was not attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl FixRecord {
    pub fn applied(host: &str, rule_id: &str, outcome: RemediationOutcome) -> Self {
        Self {
            host: host.to_string(),
            rule_id: rule_id.to_string(),
            outcome: Some(outcome),
            error: None,
            skipped: None,
        }
    }

    pub fn failed(host: &str, rule_id: &str, error: impl Into<String>) -> Self {
        Self {
            host: host.to_string(),
            rule_id: rule_id.to_string(),
            outcome: None,
            error: Some(error.into()),
            skipped: None,
        }
    }

    pub fn skipped(host: &str, rule_id: &str, reason: impl Into<String>) -> Self {
        Self {
            host: host.to_string(),
            rule_id: rule_id.to_string(),
            outcome: None,
            error: None,
            skipped: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.outcome.is_some_and(|o| o.is_success())
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Totals over all hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditStats {
    pub hosts: usize,
    pub unreachable_hosts: usize,
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed because the fact could not be read
    pub unreadable: usize,
    pub fixes_applied: usize,
    pub fixes_failed: usize,
    /// Fixes left for an operator in an unattended run
    pub fixes_skipped: usize,
}

impl AuditStats {
    pub fn from_hosts(hosts: &[HostReport]) -> Self {
        let mut stats = Self {
            hosts: hosts.len(),
            ..Self::default()
        };
        for host in hosts {
            if host.is_unreachable() {
                stats.unreachable_hosts += 1;
            }
            stats.total_checks += host.verdicts.len();
            stats.passed += host.passed();
            stats.failed += host.failed();
            stats.unreadable += host.unreadable();
        }
        stats
    }

    /// Share of checks that passed.
    pub fn compliance_percentage(&self) -> f64 {
        if self.total_checks == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total_checks as f64) * 100.0
        }
    }
}

/// The full result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub hosts: Vec<HostReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixRecord>,
    pub stats: AuditStats,
    pub compliance_percentage: f64,
}

impl AuditReport {
    pub fn new(hosts: Vec<HostReport>) -> Self {
        let stats = AuditStats::from_hosts(&hosts);
        Self {
            generated_at: Utc::now(),
            compliance_percentage: stats.compliance_percentage(),
            hosts,
            fixes: Vec::new(),
            stats,
        }
    }

    pub fn record_fixes(&mut self, fixes: impl IntoIterator<Item = FixRecord>) {
        for fix in fixes {
            if fix.is_skipped() {
                self.stats.fixes_skipped += 1;
            } else if fix.is_success() {
                self.stats.fixes_applied += 1;
            } else {
                self.stats.fixes_failed += 1;
            }
            self.fixes.push(fix);
        }
    }

    /// Ids that failed on at least one host, in registry order.
    pub fn failed_rule_ids(&self, registry: &RuleRegistry) -> Vec<String> {
        registry
            .ids()
            .into_iter()
            .filter(|id| {
                self.hosts
                    .iter()
                    .any(|h| h.failed_rule_ids().any(|failed| failed == *id))
            })
            .map(str::to_string)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }

    /// 3 when a host was unreachable, 2 when a check failed or a fix did not
    /// succeed, else 0.
    pub fn exit_code(&self) -> i32 {
        if self.stats.unreachable_hosts > 0 {
            3
        } else if self.has_failures() || self.stats.fixes_failed > 0 {
            2
        } else {
            0
        }
    }
}
