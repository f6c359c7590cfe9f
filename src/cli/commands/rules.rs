//! Rules command - list the benchmark rules

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use super::CommandContext;
use esxguard::benchmark::{RemediationKind, RuleEntry, Section};

/// Arguments for the rules command
#[derive(Parser, Debug, Clone)]
pub struct RulesArgs {
    /// Only list rules of this benchmark section (2, 3, 4, 5 or 7)
    #[arg(long)]
    pub section: Option<u8>,
}

/// One row of the rule listing
#[derive(Debug, Clone, Serialize)]
struct RuleListing<'a> {
    id: &'a str,
    section: Section,
    title: &'a str,
    remediation: RemediationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias_of: Option<&'a str>,
}

impl<'a> From<&'a RuleEntry> for RuleListing<'a> {
    fn from(entry: &'a RuleEntry) -> Self {
        Self {
            id: &entry.id,
            section: entry.rule.section(),
            title: &entry.title,
            remediation: entry.rule.remediation_kind(),
            alias_of: entry.is_alias().then(|| entry.canonical_id()),
        }
    }
}

impl RulesArgs {
    /// Execute the rules command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let listing: Vec<RuleListing<'_>> = ctx
            .registry
            .entries()
            .map(RuleListing::from)
            .filter(|r| self.section.map_or(true, |s| r.section.number() == s))
            .collect();

        if ctx.output.is_json() {
            ctx.output.json(&listing)?;
            return Ok(0);
        }

        let rows: Vec<Vec<String>> = listing
            .iter()
            .map(|r| {
                let remediation = match r.alias_of {
                    Some(target) => format!("{} (shared with {})", r.remediation, target),
                    None => r.remediation.to_string(),
                };
                vec![
                    r.id.to_string(),
                    r.section.to_string(),
                    r.title.to_string(),
                    remediation,
                ]
            })
            .collect();

        ctx.output
            .table(&["ID", "SECTION", "TITLE", "REMEDIATION"], &rows);
        Ok(0)
    }
}
