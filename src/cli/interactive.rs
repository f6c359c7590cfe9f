//! Interactive prompts for esxguard using dialoguer.
//!
//! All prompts are written to stderr so that report output on stdout stays
//! clean.

use anyhow::{Context, Result};
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};

use esxguard::benchmark::{BenchmarkError, BenchmarkResult, Operator, RuleRegistry};
use esxguard::connection::config::{expand_path, DEFAULT_IDENTITY_FILE, DEFAULT_USER};
use esxguard::connection::{Credentials, HostConfig};

/// A host entered at the prompt together with its credentials.
#[derive(Debug, Clone)]
pub struct CollectedHost {
    pub host: HostConfig,
    pub credentials: Credentials,
}

/// Interactive session state
pub struct InteractiveSession {
    term: Term,
    theme: ColorfulTheme,
}

impl Default for InteractiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveSession {
    /// Create a new interactive session
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }

    /// Whether someone is at the terminal to answer
    pub fn is_attended(&self) -> bool {
        self.term.is_term()
    }

    /// Ask for hosts until the operator declines to add another.
    pub fn collect_hosts(&self) -> Result<Vec<CollectedHost>> {
        let mut hosts = Vec::new();

        loop {
            let address: String = Input::with_theme(&self.theme)
                .with_prompt("ESXi host IP address")
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.trim().is_empty() {
                        Err("Address cannot be empty")
                    } else {
                        Ok(())
                    }
                })
                .interact_on(&self.term)
                .context("Failed to read host address")?;

            let user: String = Input::with_theme(&self.theme)
                .with_prompt("Username")
                .default(DEFAULT_USER.to_string())
                .interact_on(&self.term)?;

            let method = Select::with_theme(&self.theme)
                .with_prompt("Authentication method")
                .items(&["Password", "Private key"])
                .default(0)
                .interact_on(&self.term)?;

            let credentials = if method == 0 {
                Credentials::password(self.password(&format!("Password for {}@{}", user, address))?)
            } else {
                let key_path: String = Input::with_theme(&self.theme)
                    .with_prompt("Private key path")
                    .default(DEFAULT_IDENTITY_FILE.to_string())
                    .interact_on(&self.term)?;
                let passphrase = Password::with_theme(&self.theme)
                    .with_prompt("Key passphrase (empty for none)")
                    .allow_empty_password(true)
                    .interact_on(&self.term)
                    .context("Failed to read key passphrase")?;
                Credentials::private_key(
                    expand_path(&key_path),
                    (!passphrase.is_empty()).then_some(passphrase),
                )
            };

            hosts.push(CollectedHost {
                host: HostConfig::new(address.trim()).user(user.trim()),
                credentials,
            });

            if !self.confirm("Add another host?", false)? {
                break;
            }
        }

        Ok(hosts)
    }

    /// Ask which rules to check. Unknown ids are skipped with a warning; when
    /// none is valid every rule is checked.
    pub fn select_rules(&self, registry: &RuleRegistry) -> Result<Vec<String>> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt("Rule ids to check, comma separated (empty for all)")
            .allow_empty(true)
            .interact_on(&self.term)?;

        let (selected, rejected) = registry.resolve(&answer);
        for token in &rejected {
            self.warning(&format!("Unknown rule '{}' skipped", token));
        }
        if selected.len() == registry.len() && !answer.trim().is_empty() {
            self.warning("No valid rule id given, checking all rules");
        }
        Ok(selected)
    }

    /// Ask which failed rules to fix. Empty or all-invalid input picks every
    /// failed rule.
    pub fn select_fixes(&self, failed: &[String]) -> Result<Vec<String>> {
        self.term
            .write_line(&format!("Failed rules: {}", failed.join(", ")))?;
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt("Rule ids to fix (empty for all failed)")
            .allow_empty(true)
            .interact_on(&self.term)?;

        Ok(self.filter_fixes(&answer, failed))
    }

    fn filter_fixes(&self, answer: &str, failed: &[String]) -> Vec<String> {
        let mut chosen = Vec::new();
        for token in answer
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if failed.iter().any(|id| id == token) {
                if !chosen.iter().any(|id: &String| id == token) {
                    chosen.push(token.to_string());
                }
            } else {
                self.warning(&format!("'{}' did not fail, skipped", token));
            }
        }

        if chosen.is_empty() {
            failed.to_vec()
        } else {
            failed
                .iter()
                .filter(|id| chosen.contains(id))
                .cloned()
                .collect()
        }
    }

    /// Prompt for a password without echo
    pub fn password(&self, prompt: &str) -> Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_on(&self.term)
            .context("Failed to read password")
    }

    /// Prompt for confirmation
    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact_on(&self.term)?)
    }

    /// Show a warning message
    pub fn warning(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {}", "[WARN]".yellow().bold(), message));
    }

    /// Show an info message
    pub fn info(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {}", "[INFO]".blue().bold(), message));
    }
}

fn prompt_error(e: impl std::fmt::Display) -> BenchmarkError {
    BenchmarkError::Prompt(e.to_string())
}

impl Operator for InteractiveSession {
    fn select_targets(&self, prompt: &str, items: &[String]) -> BenchmarkResult<String> {
        for (i, item) in items.iter().enumerate() {
            self.term
                .write_line(&format!("  {:>3}. {}", i + 1, item))
                .map_err(prompt_error)?;
        }
        Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("{} ('all' or numbers, comma separated)", prompt))
            .allow_empty(true)
            .interact_on(&self.term)
            .map_err(prompt_error)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> BenchmarkResult<String> {
        let prompt = match default {
            Some(d) => format!("{} [{}]", prompt, d),
            None => prompt.to_string(),
        };
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_on(&self.term)
            .map_err(prompt_error)
    }

    fn reject(&self, message: &str) {
        self.warning(message);
    }

    fn notice(&self, message: &str) {
        self.info(message);
    }

    fn is_attended(&self) -> bool {
        InteractiveSession::is_attended(self)
    }
}
