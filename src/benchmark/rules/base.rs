//! Section 2: image profile and base host settings.

use async_trait::async_trait;
use tracing::info;

use crate::benchmark::commands;
use crate::benchmark::policy::{self, IntPolicy};
use crate::benchmark::remediation::{Operator, RemediationOutcome};
use crate::benchmark::rule::{RemediationKind, Rule, RuleContext};
use crate::benchmark::verdict::{Detail, Verdict};
use crate::benchmark::{BenchmarkResult, Section};
use crate::connection::ConnectionResult;

/// 2.4: host and every VIB at an allowed acceptance level.
#[derive(Debug, Default)]
pub struct AcceptanceLevelRule;

#[async_trait]
impl Rule for AcceptanceLevelRule {
    fn id(&self) -> &str {
        "2.4"
    }

    fn title(&self) -> &str {
        "Host image profile acceptance level"
    }

    fn section(&self) -> Section {
        Section::Base
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::Direct
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let esx = ctx.esx();
        let host_level = esx.acceptance_level().await?;
        let offending_vibs = policy::offending_vibs(&esx.vibs().await?);
        let passed = policy::acceptance_compliant(host_level.as_deref(), &offending_vibs);

        Ok(ctx.verdict(
            self,
            passed,
            Detail::AcceptanceLevel {
                host_level,
                offending_vibs,
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
            .write(&commands::acceptance_set(policy::REMEDIATION_ACCEPTANCE_LEVEL))
            .await?;
        info!(host = %ctx.host, level = policy::REMEDIATION_ACCEPTANCE_LEVEL, "Acceptance level set");
        Ok(RemediationOutcome::Applied(1))
    }
}

/// An integer `esxcli system settings advanced` option.
#[derive(Debug, Clone)]
pub struct AdvancedSettingRule {
    id: &'static str,
    title: &'static str,
    section: Section,
    path: &'static str,
    policy: IntPolicy,
}

impl AdvancedSettingRule {
    pub fn new(
        id: &'static str,
        title: &'static str,
        section: Section,
        path: &'static str,
        policy: IntPolicy,
    ) -> Self {
        Self {
            id,
            title,
            section,
            path,
            policy,
        }
    }

    /// 2.10
    pub fn share_force_salting() -> Self {
        Self::new(
            "2.10",
            "Mem.ShareForceSalting",
            Section::Base,
            "/Mem/ShareForceSalting",
            IntPolicy::Equals(policy::SHARE_FORCE_SALTING),
        )
    }

    /// 3.7
    pub fn dcui_timeout() -> Self {
        Self::new(
            "3.7",
            "DCUI timeout",
            Section::Management,
            "/UserVars/DcuiTimeOut",
            IntPolicy::Within {
                max: policy::DCUI_TIMEOUT_MAX,
            },
        )
    }

    /// 3.8
    pub fn shell_interactive_timeout() -> Self {
        Self::new(
            "3.8",
            "ESXi Shell interactive timeout",
            Section::Management,
            "/UserVars/ESXiShellInteractiveTimeOut",
            IntPolicy::Within {
                max: policy::SHELL_INTERACTIVE_TIMEOUT_MAX,
            },
        )
    }

    /// 3.9
    pub fn shell_timeout() -> Self {
        Self::new(
            "3.9",
            "ESXi Shell timeout",
            Section::Management,
            "/UserVars/ESXiShellTimeOut",
            IntPolicy::Within {
                max: policy::SHELL_TIMEOUT_MAX,
            },
        )
    }
}

#[async_trait]
impl Rule for AdvancedSettingRule {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn section(&self) -> Section {
        self.section
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::Direct
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let current_value = ctx.esx().advanced_int(self.path).await?;
        Ok(ctx.verdict(
            self,
            self.policy.is_compliant(current_value),
            Detail::Integer {
                setting: self.path.to_string(),
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
            .write(&commands::advanced_set(self.path, value))
            .await?;
        info!(host = %ctx.host, setting = self.path, value, "Advanced setting updated");
        Ok(RemediationOutcome::Applied(1))
    }
}
