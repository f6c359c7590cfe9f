//! Policy predicates and the thresholds they enforce.
//!
//! Every predicate treats an absent fact as non-compliant.

use std::fmt;

use super::facts::{PortGroup, Vib};
use super::parsers::SYSLOG_NONE;

/// Acceptance levels a CIS-hardened host may run at.
pub const ALLOWED_ACCEPTANCE_LEVELS: [&str; 3] =
    ["VMwareCertified", "VMwareAccepted", "PartnerSupported"];

/// Level written by remediation.
pub const REMEDIATION_ACCEPTANCE_LEVEL: &str = "PartnerSupported";

pub const SHARE_FORCE_SALTING: i64 = 2;
pub const DCUI_TIMEOUT_MAX: i64 = 600;
pub const SHELL_INTERACTIVE_TIMEOUT_MAX: i64 = 300;
pub const SHELL_TIMEOUT_MAX: i64 = 3600;
pub const ACCOUNT_LOCK_FAILURES: i64 = 5;
pub const ACCOUNT_UNLOCK_TIME: i64 = 900;

/// VLAN ids a port group must not use: untagged, the default VLAN and trunking.
pub const FORBIDDEN_VLANS: [u16; 3] = [0, 1, 4095];

/// Compliance predicate for integer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPolicy {
    /// Exactly this value
    Equals(i64),
    /// Strictly positive, at most `max`
    Within { max: i64 },
}

impl IntPolicy {
    pub fn is_compliant(&self, value: Option<i64>) -> bool {
        match (self, value) {
            (_, None) => false,
            (IntPolicy::Equals(expected), Some(v)) => v == *expected,
            (IntPolicy::Within { max }, Some(v)) => v > 0 && v <= *max,
        }
    }

    /// The value remediation writes. Timeouts go to their maximum.
    pub fn remediation_value(&self) -> i64 {
        match self {
            IntPolicy::Equals(v) => *v,
            IntPolicy::Within { max } => *max,
        }
    }
}

impl fmt::Display for IntPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntPolicy::Equals(v) => write!(f, "= {}", v),
            IntPolicy::Within { max } => write!(f, "1..={}", max),
        }
    }
}

pub fn is_allowed_acceptance_level(level: &str) -> bool {
    ALLOWED_ACCEPTANCE_LEVELS.contains(&level)
}

/// VIBs whose acceptance level is outside the allowed set.
pub fn offending_vibs(vibs: &[Vib]) -> Vec<Vib> {
    vibs.iter()
        .filter(|vib| !is_allowed_acceptance_level(&vib.acceptance_level))
        .cloned()
        .collect()
}

/// Host level allowed and no offending VIBs.
pub fn acceptance_compliant(host_level: Option<&str>, offending: &[Vib]) -> bool {
    host_level.is_some_and(is_allowed_acceptance_level) && offending.is_empty()
}

/// The setting must be explicitly `false`.
pub fn is_disabled(value: Option<bool>) -> bool {
    value == Some(false)
}

/// A remote log host is set.
pub fn remote_log_configured(remote_host: Option<&str>) -> bool {
    matches!(remote_host, Some(host) if !host.trim().is_empty() && host.trim() != SYSLOG_NONE)
}

pub fn is_forbidden_vlan(vlan_id: u16) -> bool {
    FORBIDDEN_VLANS.contains(&vlan_id)
}

/// Port groups on a forbidden VLAN.
pub fn offending_port_groups(groups: &[PortGroup]) -> Vec<PortGroup> {
    groups
        .iter()
        .filter(|pg| is_forbidden_vlan(pg.vlan_id))
        .cloned()
        .collect()
}

/// Expected value of one key in every VM configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmSettingPolicy {
    /// `.vmx` key
    pub key: &'static str,
    /// Value a compliant VM holds
    pub expected: &'static str,
    /// Compare ignoring ASCII case
    pub case_insensitive: bool,
    /// Value remediation writes
    pub canonical: &'static str,
}

impl VmSettingPolicy {
    pub fn is_compliant(&self, value: Option<&str>) -> bool {
        match value {
            None => false,
            Some(v) if self.case_insensitive => v.eq_ignore_ascii_case(self.expected),
            Some(v) => v == self.expected,
        }
    }
}

pub const REMOTE_DISPLAY_MAX_CONNECTIONS: VmSettingPolicy = VmSettingPolicy {
    key: "RemoteDisplay.maxConnections",
    expected: "1",
    case_insensitive: false,
    canonical: "1",
};

pub const DISK_SHRINK_DISABLE: VmSettingPolicy = VmSettingPolicy {
    key: "isolation.tools.diskShrink.disable",
    expected: "true",
    case_insensitive: true,
    canonical: "TRUE",
};

pub const DISK_WIPER_DISABLE: VmSettingPolicy = VmSettingPolicy {
    key: "isolation.tools.diskWiper.disable",
    expected: "true",
    case_insensitive: true,
    canonical: "TRUE",
};

pub const GUESTLIB_HOST_INFO: VmSettingPolicy = VmSettingPolicy {
    key: "tools.guestlib.enableHostInfo",
    expected: "false",
    case_insensitive: true,
    canonical: "FALSE",
};

pub const LOG_KEEP_OLD: VmSettingPolicy = VmSettingPolicy {
    key: "log.keepOld",
    expected: "10",
    case_insensitive: false,
    canonical: "10",
};

pub const LOG_ROTATE_SIZE: VmSettingPolicy = VmSettingPolicy {
    key: "log.rotateSize",
    expected: "1000000",
    case_insensitive: false,
    canonical: "1000000",
};
