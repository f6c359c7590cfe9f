//! Section 4: logging.

use async_trait::async_trait;
use tracing::info;

use crate::benchmark::commands;
use crate::benchmark::policy;
use crate::benchmark::remediation::{self, Operator, RemediationOutcome};
use crate::benchmark::rule::{RemediationKind, Rule, RuleContext};
use crate::benchmark::verdict::{Detail, Verdict};
use crate::benchmark::{BenchmarkResult, Section};
use crate::connection::ConnectionResult;

/// 4.2: logs are forwarded to a remote syslog host.
#[derive(Debug, Default)]
pub struct RemoteSyslogRule;

#[async_trait]
impl Rule for RemoteSyslogRule {
    fn id(&self) -> &str {
        "4.2"
    }

    fn title(&self) -> &str {
        "Remote syslog"
    }

    fn section(&self) -> Section {
        Section::Logging
    }

    fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::OperatorInput
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> ConnectionResult<Verdict> {
        let remote_host = ctx.esx().syslog_remote_host().await?;
        Ok(ctx.verdict(
            self,
            policy::remote_log_configured(Some(&remote_host)),
            Detail::Text {
                setting: "Remote Host".to_string(),
                current_value: Some(remote_host),
            },
        ))
    }

    async fn remediate(
        &self,
        ctx: &RuleContext<'_>,
        _previous: Option<&Verdict>,
        operator: &dyn Operator,
    ) -> BenchmarkResult<RemediationOutcome> {
        let example = ctx.settings.syslog_example.as_str();
        let loghost = remediation::prompt_until_valid(
            operator,
            &format!("[{}] Remote syslog host", ctx.host),
            Some(example),
            "Expected tcp://, udp:// or ssl:// followed by host[:port]",
            |answer| remediation::parse_loghost(answer, example),
        )?;

        let esx = ctx.esx();
        esx.write(&commands::syslog_set(&loghost)).await?;
        esx.write(commands::SYSLOG_RELOAD).await?;

        info!(host = %ctx.host, loghost = %loghost, "Remote syslog configured");
        Ok(RemediationOutcome::Applied(1))
    }
}
