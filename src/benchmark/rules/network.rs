//! Section 5: virtual networking.

use async_trait::async_trait;
use tracing::info;

use crate::benchmark::commands;
use crate::benchmark::host::SecurityFlag;
use crate::benchmark::policy;
use crate::benchmark::remediation::{self, Operator, RemediationOutcome};
use crate::benchmark::rule::{RemediationKind, Rule, RuleContext};
use crate::benchmark::verdict::{Detail, Verdict};
use crate::benchmark::{BenchmarkResult, Section};
use crate::connection::ConnectionResult;

/// 5.6 to 5.8: a vSwitch security policy switch is set to reject.
#[derive(Debug, Clone)]
pub struct VswitchSecurityRule {
    id: &'static str,
    title: &'static str,
    flag: SecurityFlag,
}

impl VswitchSecurityRule {
    /// 5.6
    pub fn forged_transmits() -> Self {
        Self {
            id: "5.6",
            title: "Reject forged transmits",
            flag: SecurityFlag::ForgedTransmits,
        }
    }

    /// 5.7
    pub fn mac_changes() -> Self {
        Self {
            id: "5.7",
            title: "Reject MAC address changes",
            flag: SecurityFlag::MacChanges,
        }
    }

    /// 5.8
    pub fn promiscuous() -> Self {
        Self {
            id: "5.8",
            title: "Reject promiscuous mode",
            flag: SecurityFlag::Promiscuous,
        }
    }
}

#[async_trait]
impl Rule for VswitchSecurityRule {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn section(&self) -> Section {
        Section::Network
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::Direct
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let vswitch = ctx.settings.vswitch.as_str();
        let current_value = ctx.esx().vswitch_flag(vswitch, self.flag).await?;
        Ok(ctx.verdict(
            self,
            policy::is_disabled(current_value),
            Detail::Boolean {
                setting: format!("{} ({})", self.flag.label(), vswitch),
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
        let vswitch = ctx.settings.vswitch.as_str();
        ctx.esx()
            .write(&commands::vswitch_security_disable(vswitch, self.flag.option()))
            .await?;
        info!(host = %ctx.host, vswitch = %vswitch, policy = self.flag.label(), "Set to reject");
        Ok(RemediationOutcome::Applied(1))
    }
}

/// 5.9 (also reported as 5.10): no port group on VLAN 0, 1 or 4095.
#[derive(Debug, Default)]
pub struct VlanHygieneRule;

#[async_trait]
impl Rule for VlanHygieneRule {
    fn id(&self) -> &str {
        "5.9"
    }

    fn title(&self) -> &str {
        "Port-group VLAN hygiene"
    }

    fn section(&self) -> Section {
        Section::Network
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::OperatorInput
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let offending = policy::offending_port_groups(&ctx.esx().port_groups().await?);
        Ok(ctx.verdict(
            self,
            offending.is_empty(),
            Detail::PortGroups { offending },
        ))
    }

    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        previous: Option<&Verdict>,
        operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome> {
        let offending = match previous.and_then(Verdict::offending_port_groups) {
            Some(groups) => groups.to_vec(),
            None => policy::offending_port_groups(&ctx.esx().port_groups().await?),
        };

        if offending.is_empty() {
            operator.notice(&format!("[{}] No port group on VLAN 0, 1 or 4095", ctx.host));
            return Ok(RemediationOutcome::NothingToFix);
        }

        let esx = ctx.esx();
        for group in &offending {
            operator.notice(&format!(
                "[{}] {} is on VLAN {}",
                ctx.host, group.name, group.vlan_id
            ));
            let vlan_id = remediation::prompt_until_valid(
                operator,
                &format!("New VLAN id for '{}'", group.name),
                None,
                "Enter a VLAN id greater than 1 and less than 4095",
                remediation::parse_replacement_vlan,
            )?;

            esx.write(&commands::portgroup_set_vlan(&group.name, vlan_id))
                .await?;
            info!(host = %ctx.host, port_group = %group.name, vlan_id, "Port group VLAN updated");
        }

        Ok(RemediationOutcome::Applied(offending.len()))
    }
}
