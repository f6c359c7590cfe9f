//! Output formatting module for esxguard
//!
//! Colored, human-readable audit output on stdout, and the single JSON report
//! document in JSON mode. Diagnostics go to stderr.

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use esxguard::audit::{AuditEvents, AuditReport, FixRecord};
use esxguard::benchmark::Verdict;
use esxguard::connection::ConnectionError;

/// Check result status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Unreachable,
}

impl CheckStatus {
    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            CheckStatus::Pass => "PASS".green().bold().to_string(),
            CheckStatus::Fail => "FAIL".red().bold().to_string(),
            CheckStatus::Unreachable => "UNREACHABLE".red().bold().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Unreachable => "UNREACHABLE",
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);

        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print one verdict and its fact lines
    pub fn verdict(&self, verdict: &Verdict) {
        if self.json_mode {
            return;
        }

        let status = if verdict.passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        let status_str = if self.use_color {
            status.colored_string()
        } else {
            status.as_str().to_string()
        };

        println!("{:<4} {:<6} {}", status_str, verdict.rule_id, verdict.title);
        for line in verdict.describe() {
            if self.use_color {
                println!("            {}", line.bright_black());
            } else {
                println!("            {}", line);
            }
        }
    }

    /// Print the result of one remediation
    pub fn fix_result(&self, record: &FixRecord) {
        if self.json_mode {
            return;
        }

        let message = match (&record.outcome, &record.error, &record.skipped) {
            (_, Some(error), _) => format!("error: {}", error),
            (_, None, Some(reason)) => reason.clone(),
            (Some(outcome), None, None) => outcome.to_string(),
            (None, None, None) => "not attempted".to_string(),
        };

        let label = if record.is_skipped() {
            "SKIPPED"
        } else if record.is_success() {
            "FIXED"
        } else {
            "NOT FIXED"
        };

        if self.use_color {
            let label = if record.is_skipped() {
                label.yellow().bold()
            } else if record.is_success() {
                label.green().bold()
            } else {
                label.red().bold()
            };
            println!(
                "{} [{}] {} => {}",
                label,
                record.host.bright_white().bold(),
                record.rule_id,
                message
            );
        } else {
            println!("{} [{}] {} => {}", label, record.host, record.rule_id, message);
        }
    }

    /// Print the audit recap
    pub fn recap(&self, report: &AuditReport) {
        if self.json_mode {
            return;
        }

        let header = "AUDIT RECAP";
        let stars = "*".repeat(80 - header.len());

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }

        for host in &report.hosts {
            if host.is_unreachable() {
                let status = if self.use_color {
                    CheckStatus::Unreachable.colored_string()
                } else {
                    CheckStatus::Unreachable.as_str().to_string()
                };
                println!(
                    "{:<30} : {} ({})",
                    host.host,
                    status,
                    host.error.as_deref().unwrap_or_default()
                );
                continue;
            }

            let line = format!(
                "{:<30} : passed={:<4} failed={:<4} unreadable={:<4}",
                host.host,
                host.passed(),
                host.failed(),
                host.unreadable()
            );

            if self.use_color {
                if host.failed() > 0 {
                    println!("{}", line.red());
                } else {
                    println!("{}", line.green());
                }
            } else {
                println!("{}", line);
            }
        }

        let stats = &report.stats;
        let summary = format!(
            "{} checks on {} host(s): {} passed, {} failed ({:.1}% compliant)",
            stats.total_checks,
            stats.hosts,
            stats.passed,
            stats.failed,
            report.compliance_percentage
        );
        if self.use_color {
            println!("\n{}", summary.bright_white());
            println!(
                "{} {}",
                "Audit took".bright_black(),
                format_duration(self.start_time.elapsed()).bright_white()
            );
        } else {
            println!("\n{}", summary);
            println!("Audit took {}", format_duration(self.start_time.elapsed()));
        }
    }

    /// Print a serializable document as pretty JSON on stdout
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        // Print header
        let mut header_line = String::new();
        for (i, h) in headers.iter().enumerate() {
            if i > 0 {
                header_line.push_str(" | ");
            }
            header_line.push_str(&format!("{:width$}", h, width = widths[i]));
        }

        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{}", header_line);
        }

        // Print separator
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        // Print rows
        for row in rows {
            let mut row_line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    row_line.push_str(" | ");
                }
                if i < widths.len() {
                    row_line.push_str(&format!("{:width$}", cell, width = widths[i]));
                }
            }
            println!("{}", row_line.trim_end());
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl AuditEvents for OutputFormatter {
    fn on_host_start(&self, host: &str) {
        self.section(&format!("HOST [{}]", host));
        self.flush();
    }

    fn on_verdict(&self, verdict: &Verdict) {
        self.verdict(verdict);
        self.flush();
    }

    fn on_host_error(&self, host: &str, error: &ConnectionError) {
        self.error(&format!(
            "{}: {}; remaining checks for this host skipped",
            host, error
        ));
    }

    fn on_fix(&self, record: &FixRecord) {
        self.fix_result(record);
        self.flush();
    }
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}h {}m {}s", hours, mins, secs)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
