//! Remediation support: operator interaction and answer validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BenchmarkResult;

/// Accepted remote syslog targets.
static LOGHOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(tcp|udp|ssl)://[^\s'"]+$"#).expect("Invalid loghost regex")
});

/// The person answering remediation questions.
///
/// Prompts block the run until answered.
pub trait Operator: Send + Sync {
    /// Show `items` as a numbered list and return the raw answer
    /// (`all` or 1-based indices).
    fn select_targets(&self, prompt: &str, items: &[String]) -> BenchmarkResult<String>;

    /// Ask for a value. An empty answer is returned as-is; callers apply
    /// `default` themselves so they can report it.
    fn input(&self, prompt: &str, default: Option<&str>) -> BenchmarkResult<String>;

    /// Tell the operator an answer was not accepted.
    fn reject(&self, message: &str);

    /// Progress message.
    fn notice(&self, message: &str);

    /// False when nobody can answer prompts; rules that need input are then
    /// skipped instead of attempted.
    fn is_attended(&self) -> bool {
        true
    }
}

/// Result of one remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "changed", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// No offenders; nothing was changed
    NothingToFix,
    /// Offenders exist but the operator selected none
    NoSelection,
    /// This many targets were changed
    Applied(usize),
}

impl RemediationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RemediationOutcome::NoSelection)
    }
}

impl fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationOutcome::NothingToFix => write!(f, "nothing to fix"),
            RemediationOutcome::NoSelection => write!(f, "no target selected"),
            RemediationOutcome::Applied(n) => write!(f, "{} change(s) applied", n),
        }
    }
}

/// 0-based indices chosen by `answer` out of `len` items.
///
/// `all` (any case) selects everything; otherwise comma or whitespace
/// separated 1-based numbers. Invalid and out-of-range entries are ignored,
/// duplicates collapse, answer order is kept.
pub fn parse_selection(answer: &str, len: usize) -> Vec<usize> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") {
        return (0..len).collect();
    }

    let mut selected = Vec::new();
    for token in answer.replace(',', " ").split_whitespace() {
        if let Ok(n) = token.parse::<usize>() {
            if (1..=len).contains(&n) && !selected.contains(&(n - 1)) {
                selected.push(n - 1);
            }
        }
    }
    selected
}

/// A VLAN id a port group may be moved to: digits only, 1 < id < 4095.
pub fn parse_replacement_vlan(answer: &str) -> Option<u16> {
    let answer = answer.trim();
    if answer.is_empty() || !answer.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    answer.parse::<u16>().ok().filter(|id| *id > 1 && *id < 4095)
}

/// A loghost answer; empty falls back to `default`.
pub fn parse_loghost(answer: &str, default: &str) -> Option<String> {
    let answer = answer.trim();
    let candidate = if answer.is_empty() { default } else { answer };
    LOGHOST_RE
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// Ask until `parse` accepts the answer.
pub fn prompt_until_valid<T>(
    operator: &dyn Operator,
    prompt: &str,
    default: Option<&str>,
    rejection: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> BenchmarkResult<T> {
    loop {
        let answer = operator.input(prompt, default)?;
        match parse(&answer) {
            Some(value) => return Ok(value),
            None => operator.reject(rejection),
        }
    }
}
