//! Check verdicts.

use serde::{Deserialize, Serialize};

use super::facts::{PortGroup, Vib, VmDescriptor};

/// Text shown in place of a fact the parser could not extract.
pub const UNREADABLE: &str = "could not read value";

/// Supporting facts of a verdict, one shape per rule family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    AcceptanceLevel {
        host_level: Option<String>,
        offending_vibs: Vec<Vib>,
    },
    Integer {
        setting: String,
        current_value: Option<i64>,
        expected: String,
    },
    Boolean {
        setting: String,
        current_value: Option<bool>,
        expected: bool,
    },
    Text {
        setting: String,
        current_value: Option<String>,
    },
    PortGroups {
        offending: Vec<PortGroup>,
    },
    VirtualMachines {
        setting: String,
        total: usize,
        failed_vms: Vec<VmDescriptor>,
    },
}

/// Outcome of one rule on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub host: String,
    pub rule_id: String,
    pub title: String,
    pub passed: bool,
    pub detail: Detail,
}

impl Verdict {
    pub fn new(
        host: impl Into<String>,
        rule_id: impl Into<String>,
        title: impl Into<String>,
        passed: bool,
        detail: Detail,
    ) -> Self {
        Self {
            host: host.into(),
            rule_id: rule_id.into(),
            title: title.into(),
            passed,
            detail,
        }
    }

    /// Same verdict reported under another rule id.
    pub fn relabeled(&self, rule_id: &str, title: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            title: title.to_string(),
            ..self.clone()
        }
    }

    /// The primary fact of this check could not be read.
    pub fn is_unreadable(&self) -> bool {
        match &self.detail {
            Detail::AcceptanceLevel { host_level, .. } => host_level.is_none(),
            Detail::Integer { current_value, .. } => current_value.is_none(),
            Detail::Boolean { current_value, .. } => current_value.is_none(),
            Detail::Text { current_value, .. } => current_value.is_none(),
            Detail::PortGroups { .. } | Detail::VirtualMachines { .. } => false,
        }
    }

    /// VMs that failed a per-VM check.
    pub fn failed_vms(&self) -> Option<&[VmDescriptor]> {
        match &self.detail {
            Detail::VirtualMachines { failed_vms, .. } => Some(failed_vms),
            _ => None,
        }
    }

    /// Port groups on a forbidden VLAN.
    pub fn offending_port_groups(&self) -> Option<&[PortGroup]> {
        match &self.detail {
            Detail::PortGroups { offending } => Some(offending),
            _ => None,
        }
    }

    /// Human readable fact lines.
    pub fn describe(&self) -> Vec<String> {
        match &self.detail {
            Detail::AcceptanceLevel {
                host_level,
                offending_vibs,
            } => {
                let mut lines = vec![format!(
                    "Host acceptance level: {}",
                    host_level.as_deref().unwrap_or(UNREADABLE)
                )];
                if offending_vibs.is_empty() {
                    lines.push("All VIBs are at an allowed acceptance level".to_string());
                } else {
                    lines.extend(offending_vibs.iter().map(|vib| format!("VIB {}", vib)));
                }
                lines
            }
            Detail::Integer {
                setting,
                current_value,
                expected,
            } => vec![format!(
                "{}: {} (expected {})",
                setting,
                current_value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| UNREADABLE.to_string()),
                expected
            )],
            Detail::Boolean {
                setting,
                current_value,
                expected,
            } => vec![format!(
                "{}: {} (expected {})",
                setting,
                current_value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| UNREADABLE.to_string()),
                expected
            )],
            Detail::Text {
                setting,
                current_value,
            } => vec![format!(
                "{}: {}",
                setting,
                current_value.as_deref().unwrap_or(UNREADABLE)
            )],
            Detail::PortGroups { offending } => {
                if offending.is_empty() {
                    vec!["No port group uses VLAN 0, 1 or 4095".to_string()]
                } else {
                    offending
                        .iter()
                        .map(|pg| format!("Port group {}", pg))
                        .collect()
                }
            }
            Detail::VirtualMachines {
                setting,
                total,
                failed_vms,
            } => {
                if *total == 0 {
                    return vec!["No virtual machines found".to_string()];
                }
                let mut lines = vec![format!(
                    "{} of {} VMs non-compliant for {}",
                    failed_vms.len(),
                    total,
                    setting
                )];
                lines.extend(failed_vms.iter().map(|vm| {
                    format!(
                        "{}: {}",
                        vm.name,
                        vm.current_value.as_deref().unwrap_or(UNREADABLE)
                    )
                }));
                lines
            }
        }
    }
}
