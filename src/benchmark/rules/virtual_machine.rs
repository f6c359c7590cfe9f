//! Section 7: settings in every virtual machine's `.vmx` file.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::benchmark::commands;
use crate::benchmark::facts::VmDescriptor;
use crate::benchmark::policy::{self, VmSettingPolicy};
use crate::benchmark::remediation::{self, Operator, RemediationOutcome};
use crate::benchmark::rule::{RemediationKind, Rule, RuleContext};
use crate::benchmark::verdict::{Detail, Verdict};
use crate::benchmark::{BenchmarkResult, Section};
use crate::connection::ConnectionResult;

/// One `.vmx` key that every VM must hold at the expected value.
#[derive(Debug, Clone)]
pub struct VmSettingRule {
    id: &'static str,
    policy: VmSettingPolicy,
}

impl VmSettingRule {
    pub fn new(id: &'static str, policy: VmSettingPolicy) -> Self {
        Self { id, policy }
    }

    /// All section 7 rules.
    pub fn all() -> Vec<Self> {
        vec![
            Self::new("7.6", policy::REMOTE_DISPLAY_MAX_CONNECTIONS),
            Self::new("7.21", policy::DISK_SHRINK_DISABLE),
            Self::new("7.22", policy::DISK_WIPER_DISABLE),
            Self::new("7.24", policy::GUESTLIB_HOST_INFO),
            Self::new("7.26", policy::LOG_KEEP_OLD),
            Self::new("7.27", policy::LOG_ROTATE_SIZE),
        ]
    }

    /// Enumerate VMs and return the total and those not compliant.
    async fn scan(&self, ctx: &RuleContext<'_>) -> ConnectionResult<(usize, Vec<VmDescriptor>)> {
        let esx = ctx.esx();
        let vms = esx.virtual_machines().await?;

        let mut failed = Vec::new();
        for vm in &vms {
            let value = esx.vmx_setting(&vm.path, self.policy.key).await?;
            debug!(
                host = %ctx.host,
                vm = %vm.name,
                key = self.policy.key,
                value = ?value,
                "VM setting read"
            );
            if !self.policy.is_compliant(value.as_deref()) {
                failed.push(vm.with_value(value));
            }
        }

        Ok((vms.len(), failed))
    }
}

#[async_trait]
impl Rule for VmSettingRule {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.policy.key
    }

    fn section(&self) -> Section {
        Section::VirtualMachine
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::PerVm
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let (total, failed_vms) = self.scan(ctx).await?;
        Ok(ctx.verdict(
            self,
            failed_vms.is_empty(),
            Detail::VirtualMachines {
                setting: self.policy.key.to_string(),
                total,
                failed_vms,
            },
        ))
    }

    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        previous: Option<&Verdict>,
        operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome> {
        let failed = match previous.and_then(Verdict::failed_vms) {
            Some(vms) => vms.to_vec(),
            None => self.scan(ctx).await?.1,
        };

        if failed.is_empty() {
            operator.notice(&format!(
                "[{}] No VM needs {} changed",
                ctx.host, self.policy.key
            ));
            return Ok(RemediationOutcome::NothingToFix);
        }

        let names: Vec<String> = failed.iter().map(|vm| vm.name.clone()).collect();
        let answer = operator.select_targets(
            &format!("[{}] VMs to fix for {} ('all' or numbers)", ctx.host, self.policy.key),
            &names,
        )?;
        let selected = remediation::parse_selection(&answer, failed.len());
        if selected.is_empty() {
            operator.notice("No VM selected");
            return Ok(RemediationOutcome::NoSelection);
        }

        let esx = ctx.esx();
        for vm in selected.iter().map(|&i| &failed[i]) {
            operator.notice(&format!("Fixing VM {}", vm.name));
            esx.write(&commands::vmx_delete(self.policy.key, &vm.path))
                .await?;
            esx.write(&commands::vmx_append(
                self.policy.key,
                self.policy.canonical,
                &vm.path,
            ))
            .await?;
            esx.write(&commands::vm_reload(&vm.id)).await?;
            info!(
                host = %ctx.host,
                vm = %vm.name,
                key = self.policy.key,
                value = self.policy.canonical,
                "VM setting written"
            );
        }

        Ok(RemediationOutcome::Applied(selected.len()))
    }
}
