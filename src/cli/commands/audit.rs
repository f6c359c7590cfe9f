//! Audit command - check hosts against the benchmark and fix failures
//!
//! Hosts come from `--host`, from the `[[hosts]]` configuration table, or,
//! at a terminal, from prompts. After the summary, failed rules can be
//! remediated.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use super::CommandContext;
use crate::cli::interactive::InteractiveSession;
use esxguard::audit::{AuditReport, Auditor};
use esxguard::benchmark::RuleRegistry;
use esxguard::connection::config::{default_identity_files, expand_path};
use esxguard::connection::{ConnectionDefaults, Credentials, HostConfig, HostTarget, SshExecutor};
use esxguard::error::Error;

/// Password used for every host when password authentication is requested
pub const PASSWORD_ENV: &str = "ESXGUARD_PASSWORD";

/// Passphrase for the private key, when it has one
pub const PASSPHRASE_ENV: &str = "ESXGUARD_KEY_PASSPHRASE";

/// Arguments for the audit command
#[derive(Parser, Debug, Clone)]
pub struct AuditArgs {
    /// Host to audit (repeatable); defaults to the configured hosts
    #[arg(short = 'H', long = "host", action = clap::ArgAction::Append)]
    pub hosts: Vec<String>,

    /// Rule ids to check, comma separated (default: all)
    #[arg(short = 'r', long)]
    pub rules: Option<String>,

    /// Remote user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// SSH port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Private key file
    #[arg(short = 'i', long)]
    pub identity_file: Option<PathBuf>,

    /// Authenticate with a password (prompted, or ESXGUARD_PASSWORD)
    #[arg(long)]
    pub password_auth: bool,

    /// Remediate failed rules without asking first
    #[arg(long, conflicts_with = "no_fix")]
    pub fix: bool,

    /// Never remediate
    #[arg(long)]
    pub no_fix: bool,
}

impl AuditArgs {
    /// Execute the audit command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let session = InteractiveSession::new();
        let attended = session.is_attended();

        let flag_rules = match &self.rules {
            Some(list) => Some(rules_from_flag(&ctx.registry, list)?),
            None => None,
        };

        let targets = self.targets(ctx, &session)?;
        if targets.is_empty() {
            bail!("No hosts given; pass --host or add [[hosts]] to the configuration");
        }

        let rule_ids = match flag_rules {
            Some(ids) => ids,
            None if attended && !ctx.output.is_json() => session.select_rules(&ctx.registry)?,
            None => ctx.registry.resolve("").0,
        };

        ctx.output.banner("CIS VMWARE ESXI 8 AUDIT");
        info!(hosts = targets.len(), rules = rule_ids.len(), "Starting audit");

        let auditor = Auditor::new(ctx.registry.clone(), ctx.config.benchmark.clone());
        let executors: Vec<SshExecutor> = targets
            .into_iter()
            .map(|t| SshExecutor::new(t, ctx.config.defaults.clone()))
            .collect();

        let mut hosts = Vec::with_capacity(executors.len());
        for executor in &executors {
            let address = executor.target().address.clone();
            hosts.push(
                auditor
                    .audit_host(&address, executor, &rule_ids, &ctx.output)
                    .await,
            );
        }

        let mut report = AuditReport::new(hosts);
        ctx.output.recap(&report);

        let failed = report.failed_rule_ids(&ctx.registry);
        if failed.is_empty() {
            debug!("Nothing failed, skipping remediation");
        } else if self.wants_fix(&session, attended)? {
            let fix_ids = if attended {
                session.select_fixes(&failed)?
            } else {
                failed
            };

            ctx.output.section("REMEDIATION");
            let mut fixes = Vec::new();
            for (executor, host) in executors.iter().zip(&report.hosts) {
                fixes.extend(
                    auditor
                        .remediate_host(host, executor, &fix_ids, &session, &ctx.output)
                        .await,
                );
            }
            report.record_fixes(fixes);

            if !ctx.output.is_json() {
                println!(
                    "\n{} fix(es) applied, {} not applied, {} skipped",
                    report.stats.fixes_applied, report.stats.fixes_failed, report.stats.fixes_skipped
                );
                if report.stats.fixes_skipped > 0 {
                    ctx.output.warning("Rules that need an answer were skipped; rerun at a terminal to fix them");
                }
            }
        }

        if ctx.output.is_json() {
            ctx.output.json(&report)?;
        }

        Ok(report.exit_code())
    }

    fn wants_fix(&self, session: &InteractiveSession, attended: bool) -> Result<bool> {
        if self.no_fix {
            Ok(false)
        } else if self.fix {
            Ok(true)
        } else if attended {
            session.confirm("Remediate failed rules?", false)
        } else {
            Ok(false)
        }
    }

    /// Resolve the hosts to audit with their credentials.
    fn targets(&self, ctx: &CommandContext, session: &InteractiveSession) -> Result<Vec<HostTarget>> {
        let defaults = &ctx.config.defaults;

        let configured: Vec<HostConfig> = if !self.hosts.is_empty() {
            self.hosts.iter().map(|h| self.apply_overrides(HostConfig::new(h))).collect()
        } else {
            ctx.config
                .hosts
                .iter()
                .cloned()
                .map(|h| self.apply_overrides(h))
                .collect()
        };

        if configured.is_empty() {
            if !session.is_attended() {
                return Ok(Vec::new());
            }
            return session
                .collect_hosts()?
                .into_iter()
                .map(|c| {
                    c.host
                        .to_target(defaults, c.credentials)
                        .map_err(|e| anyhow::Error::from(Error::from(e)))
                })
                .collect();
        }

        configured
            .iter()
            .map(|host| {
                let credentials = self.credentials_for(host, defaults, session)?;
                host.to_target(defaults, credentials)
                    .map_err(|e| anyhow::Error::from(Error::from(e)))
            })
            .collect()
    }

    fn apply_overrides(&self, mut host: HostConfig) -> HostConfig {
        if let Some(user) = &self.user {
            host.user = Some(user.clone());
        }
        if let Some(port) = self.port {
            host.port = Some(port);
        }
        host
    }

    fn credentials_for(
        &self,
        host: &HostConfig,
        defaults: &ConnectionDefaults,
        session: &InteractiveSession,
    ) -> Result<Credentials> {
        if self.password_auth {
            if let Ok(password) = std::env::var(PASSWORD_ENV) {
                return Ok(Credentials::password(password));
            }
            if !session.is_attended() {
                bail!("--password-auth needs a terminal or {}", PASSWORD_ENV);
            }
            let user = host.user.as_deref().unwrap_or(&defaults.user);
            let password = session.password(&format!("Password for {}@{}", user, host.address))?;
            return Ok(Credentials::password(password));
        }

        let passphrase = std::env::var(PASSPHRASE_ENV).ok();
        let key = self
            .identity_file
            .clone()
            .or_else(|| host.effective_identity_file(defaults).map(expand_path));

        Ok(match key {
            Some(path) => Credentials::private_key(path, passphrase),
            None if host.use_agent => Credentials::Agent,
            None => match default_identity_files().into_iter().next() {
                Some(path) => Credentials::private_key(path, passphrase),
                None => Credentials::Agent,
            },
        })
    }
}

/// Rule ids from `--rules`. Unlike the prompt, an unknown id is an error.
pub fn rules_from_flag(registry: &RuleRegistry, list: &str) -> Result<Vec<String>, Error> {
    let (selected, rejected) = registry.resolve(list);
    match rejected.into_iter().next() {
        Some(unknown) => Err(Error::UnknownRule(unknown)),
        None => Ok(selected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> AuditArgs {
        let mut argv = vec!["audit"];
        argv.extend_from_slice(extra);
        AuditArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_rules_from_flag() {
        let registry = RuleRegistry::esxi8();
        assert_eq!(rules_from_flag(&registry, "3.7,2.4").unwrap(), vec!["2.4", "3.7"]);
        assert_eq!(rules_from_flag(&registry, "").unwrap().len(), registry.len());
        let err = rules_from_flag(&registry, "2.4,9.9").unwrap_err();
        assert!(matches!(err, Error::UnknownRule(ref id) if id == "9.9"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_overrides_apply_to_configured_hosts() {
        let overridden = args(&["--user", "admin", "--port", "2222"]);
        let host = overridden.apply_overrides(HostConfig::new("10.0.0.5").user("root"));
        assert_eq!(host.user.as_deref(), Some("admin"));
        assert_eq!(host.port, Some(2222));

        let untouched = args(&[]).apply_overrides(HostConfig::new("10.0.0.5").port(22));
        assert_eq!(untouched.port, Some(22));
        assert_eq!(untouched.user, None);
    }

    #[test]
    fn test_explicit_identity_file_wins() {
        let args = args(&["--identity-file", "/keys/esx"]);
        let session = InteractiveSession::new();
        let defaults = ConnectionDefaults {
            identity_file: Some("/keys/other".to_string()),
            ..ConnectionDefaults::default()
        };
        let creds = args
            .credentials_for(&HostConfig::new("10.0.0.5"), &defaults, &session)
            .unwrap();
        match creds {
            Credentials::PrivateKey { path, .. } => assert_eq!(path, PathBuf::from("/keys/esx")),
            other => panic!("unexpected credentials {:?}", other),
        }
    }
}
