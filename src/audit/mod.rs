//! Audit orchestration.
//!
//! The [`Auditor`] walks hosts and rules strictly in sequence. A transport
//! error while checking a host ends that host's audit and is recorded in its
//! [`HostReport`]; the caller carries on with the next host. Remediation
//! failures are recorded per host and rule and never stop the run. Without an
//! operator at the terminal only direct fixes are attempted.

pub mod report;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::benchmark::{
    BenchmarkSettings, Operator, RemediationKind, RuleContext, RuleRegistry, Verdict,
};
use crate::connection::{Connection, ConnectionError};

pub use report::{AuditReport, AuditStats, FixRecord, HostReport};

/// Progress callbacks for a run. All methods default to doing nothing.
pub trait AuditEvents: Send + Sync {
    fn on_host_start(&self, _host: &str) {}

    fn on_verdict(&self, _verdict: &Verdict) {}

    fn on_host_error(&self, _host: &str, _error: &ConnectionError) {}

    fn on_fix(&self, _record: &FixRecord) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentEvents;

impl AuditEvents for SilentEvents {}

/// Runs selected rules against hosts and applies fixes.
#[derive(Debug, Clone)]
pub struct Auditor {
    registry: Arc<RuleRegistry>,
    settings: BenchmarkSettings,
}

impl Auditor {
    pub fn new(registry: Arc<RuleRegistry>, settings: BenchmarkSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// Check `rule_ids` on one host.
    ///
    /// A rule exposed under several ids is evaluated once; the other ids get
    /// the same verdict under their own id and title.
    #[instrument(skip_all, fields(host = %host))]
    pub async fn audit_host(
        &self,
        host: &str,
        connection: &dyn Connection,
        rule_ids: &[String],
        events: &dyn AuditEvents,
    ) -> HostReport {
        let mut report = HostReport::new(host);
        let ctx = RuleContext::new(host, connection, &self.settings);
        let mut evaluated: HashMap<String, Verdict> = HashMap::new();

        events.on_host_start(host);
        info!(rules = rule_ids.len(), "Auditing host");

        for id in rule_ids {
            let Some(entry) = self.registry.get(id) else {
                warn!(rule = %id, "Unknown rule skipped");
                continue;
            };

            let verdict = match evaluated.get(entry.canonical_id()) {
                Some(previous) => previous.clone(),
                None => match entry.rule.check(&ctx).await {
                    Ok(verdict) => {
                        evaluated.insert(entry.canonical_id().to_string(), verdict.clone());
                        verdict
                    }
                    Err(e) => {
                        warn!(rule = %id, error = %e, "Host unreachable, skipping its remaining rules");
                        events.on_host_error(host, &e);
                        report.error = Some(e.to_string());
                        break;
                    }
                },
            };

            let verdict = if verdict.rule_id != entry.id {
                verdict.relabeled(&entry.id, &entry.title)
            } else {
                verdict
            };

            debug!(rule = %id, passed = verdict.passed, "Rule evaluated");
            events.on_verdict(&verdict);
            report.verdicts.push(verdict);
        }

        report
    }

    /// Fix the rules in `fix_ids` that failed on this host.
    ///
    /// Unreachable hosts are skipped. Each underlying rule runs at most once,
    /// reusing its audit verdict.
    #[instrument(skip_all, fields(host = %host_report.host))]
    pub async fn remediate_host(
        &self,
        host_report: &HostReport,
        connection: &dyn Connection,
        fix_ids: &[String],
        operator: &dyn Operator,
        events: &dyn AuditEvents,
    ) -> Vec<FixRecord> {
        let mut records = Vec::new();
        if host_report.is_unreachable() {
            debug!("Host unreachable, nothing to remediate");
            return records;
        }

        let host = host_report.host.as_str();
        let ctx = RuleContext::new(host, connection, &self.settings);
        let mut remediated: HashSet<String> = HashSet::new();

        for id in fix_ids {
            let Some(entry) = self.registry.get(id) else {
                continue;
            };
            let Some(verdict) = host_report.verdict(id).filter(|v| !v.passed) else {
                continue;
            };
            if !remediated.insert(entry.canonical_id().to_string()) {
                continue;
            }

            let kind = entry.rule.remediation_kind();
            let record = if kind != RemediationKind::Direct && !operator.is_attended() {
                info!(rule = %id, %kind, "Fix needs an operator, skipped");
                FixRecord::skipped(
                    host,
                    id,
                    format!("{} remediation needs an interactive terminal", kind),
                )
            } else {
                info!(rule = %id, "Remediating");
                match entry.rule.remediate(&ctx, Some(verdict), operator).await {
                    Ok(outcome) => FixRecord::applied(host, id, outcome),
                    Err(e) => {
                        warn!(rule = %id, error = %e, "Remediation failed");
                        FixRecord::failed(host, id, e.to_string())
                    }
                }
            };

            events.on_fix(&record);
            records.push(record);
        }

        records
    }
}
