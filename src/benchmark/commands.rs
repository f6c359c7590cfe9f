//! Remote command strings.
//!
//! These are sent verbatim to the ESXi shell.

pub const ACCEPTANCE_GET: &str = "esxcli software acceptance get";
pub const VIB_LIST: &str = "esxcli software vib list";
pub const SYSLOG_GET: &str = "esxcli system syslog config get";
pub const SYSLOG_RELOAD: &str = "esxcli system syslog reload";
pub const PORTGROUP_LIST: &str = "esxcli network vswitch standard portgroup list";
pub const VM_LIST: &str = "vim-cmd vmsvc/getallvms";

pub fn acceptance_set(level: &str) -> String {
    format!("esxcli software acceptance set --level={}", level)
}

pub fn advanced_get(path: &str) -> String {
    format!("esxcli system settings advanced list -o {}", path)
}

pub fn advanced_set(path: &str, value: i64) -> String {
    format!("esxcli system settings advanced set -o {} -i {}", path, value)
}

pub fn advopt_view(key: &str) -> String {
    format!("vim-cmd hostsvc/advopt/view {}", key)
}

/// `value_type` is the vim-cmd type name, `int` or `bool`.
pub fn advopt_update(key: &str, value_type: &str, value: &str) -> String {
    format!("vim-cmd hostsvc/advopt/update {} {} {}", key, value_type, value)
}

pub fn syslog_set(loghost: &str) -> String {
    format!("esxcli system syslog config set --loghost='{}'", loghost)
}

pub fn vswitch_security_get(vswitch: &str) -> String {
    format!(
        "esxcli network vswitch standard policy security get -v {}",
        vswitch
    )
}

/// `flag` is the single-letter option: `f`, `m` or `p`.
pub fn vswitch_security_disable(vswitch: &str, flag: char) -> String {
    format!(
        "esxcli network vswitch standard policy security set -v {} -{} false",
        vswitch, flag
    )
}

pub fn portgroup_set_vlan(name: &str, vlan_id: u16) -> String {
    format!(
        "esxcli network vswitch standard portgroup set -p \"{}\" -v {}",
        name, vlan_id
    )
}

pub fn vmx_grep(key: &str, path: &str) -> String {
    format!("grep \"{}\" \"{}\"", key, path)
}

pub fn vmx_delete(key: &str, path: &str) -> String {
    format!("sed -i \"/{}/d\" \"{}\"", key, path)
}

pub fn vmx_append(key: &str, value: &str, path: &str) -> String {
    format!("echo '{} = \"{}\"' >> \"{}\"", key, value, path)
}

pub fn vm_reload(vm_id: &str) -> String {
    format!("vim-cmd vmsvc/reload {}", vm_id)
}
