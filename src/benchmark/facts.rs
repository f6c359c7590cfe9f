//! Record types extracted from listing commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One installed VIB as reported by `esxcli software vib list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vib {
    /// Package name
    pub name: String,
    /// Acceptance level column, verbatim
    pub acceptance_level: String,
}

impl Vib {
    pub fn new(name: impl Into<String>, acceptance_level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            acceptance_level: acceptance_level.into(),
        }
    }
}

impl fmt::Display for Vib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.acceptance_level)
    }
}

/// A standard vSwitch port group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortGroup {
    /// Port group name (may contain spaces)
    pub name: String,
    /// VLAN id, 0..=4095
    pub vlan_id: u16,
}

impl PortGroup {
    pub fn new(name: impl Into<String>, vlan_id: u16) -> Self {
        Self {
            name: name.into(),
            vlan_id,
        }
    }
}

impl fmt::Display for PortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (VLAN {})", self.name, self.vlan_id)
    }
}

/// A registered virtual machine and, once checked, the value of one setting
/// in its configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDescriptor {
    /// Numeric id as printed by `vim-cmd vmsvc/getallvms`
    pub id: String,
    /// Display name
    pub name: String,
    /// Absolute path to the `.vmx` file
    pub path: String,
    /// Value read for the setting under check, `None` when missing
    #[serde(default)]
    pub current_value: Option<String>,
}

impl VmDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            current_value: None,
        }
    }

    /// Copy of this descriptor carrying the value that was read.
    pub fn with_value(&self, value: Option<String>) -> Self {
        Self {
            current_value: value,
            ..self.clone()
        }
    }
}
