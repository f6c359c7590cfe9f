//! Section 3: management access settings held by the host agent.

use async_trait::async_trait;
use tracing::info;

use crate::benchmark::commands;
use crate::benchmark::policy::{self, IntPolicy};
use crate::benchmark::remediation::{Operator, RemediationOutcome};
use crate::benchmark::rule::{RemediationKind, Rule, RuleContext};
use crate::benchmark::verdict::{Detail, Verdict};
use crate::benchmark::{BenchmarkResult, Section};
use crate::connection::ConnectionResult;

const MOB_KEY: &str = "Config.HostAgent.plugins.solo.enableMob";

/// 3.3: the Managed Object Browser is disabled.
#[derive(Debug, Default)]
pub struct ManagedObjectBrowserRule;

#[async_trait]
impl Rule for ManagedObjectBrowserRule {
    fn id(&self) -> &str {
        "3.3"
    }

    fn title(&self) -> &str {
        "Managed Object Browser disabled"
    }

    fn section(&self) -> Section {
        Section::Management
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::Direct
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let current_value = ctx.esx().host_agent_bool(MOB_KEY).await?;
        Ok(ctx.verdict(
            self,
            policy::is_disabled(current_value),
            Detail::Boolean {
                setting: MOB_KEY.to_string(),
                current_value,
                expected: false,
            },
        ))
    }

    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        _previous: Option<&Verdict>,
        _operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome> {
        ctx.esx()
            .write(&commands::advopt_update(MOB_KEY, "bool", "false"))
            .await?;
        info!(host = %ctx.host, "Managed Object Browser disabled");
        Ok(RemediationOutcome::Applied(1))
    }
}

/// An integer host agent option with one exact compliant value.
#[derive(Debug, Clone)]
pub struct HostAgentIntRule {
    id: &'static str,
    title: &'static str,
    key: &'static str,
    policy: IntPolicy,
}

impl HostAgentIntRule {
    /// 3.12
    pub fn account_lock_failures() -> Self {
        Self {
            id: "3.12",
            title: "Account lock failures",
            key: "Security.AccountLockFailures",
            policy: IntPolicy::Equals(policy::ACCOUNT_LOCK_FAILURES),
        }
    }

    /// 3.13
    pub fn account_unlock_time() -> Self {
        Self {
            id: "3.13",
            title: "Account unlock time",
            key: "Security.AccountUnlockTime",
            policy: IntPolicy::Equals(policy::ACCOUNT_UNLOCK_TIME),
        }
    }
}

#[async_trait]
impl Rule for HostAgentIntRule {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn section(&self) -> Section {
        Section::Management
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::Direct
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let current_value = ctx.esx().host_agent_int(self.key).await?;
        Ok(ctx.verdict(
            self,
            self.policy.is_compliant(current_value),
            Detail::Integer {
                setting: self.key.to_string(),
                current_value,
                expected: self.policy.to_string(),
            },
        ))
    }

    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        _previous: Option<&Verdict>,
        _operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome> {
        let value = self.policy.remediation_value();
        ctx.esx()
            .write(&commands::advopt_update(self.key, "int", &value.to_string()))
            .await?;
        info!(host = %ctx.host, setting = self.key, value, "Host agent option updated");
        Ok(RemediationOutcome::Applied(1))
    }
}
