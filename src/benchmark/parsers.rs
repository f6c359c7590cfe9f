//! Output parsers.
//!
//! Pure functions from raw command output to typed facts. A parser never
//! fails: output it cannot understand yields `None` (or drops the row, for
//! listings), and the policy layer treats an absent fact as non-compliant.

use indexmap::IndexMap;

use super::facts::{PortGroup, Vib, VmDescriptor};

/// Value reported by syslog when no remote host is configured.
pub const SYSLOG_NONE: &str = "<none>";

/// First line whose trimmed text starts with `prefix`, split once on `delim`,
/// right-hand side trimmed of whitespace and a trailing comma.
fn scalar_after<'a>(output: &'a str, prefix: &str, delim: char) -> Option<&'a str> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(prefix))?;
    let (_, value) = line.split_once(delim)?;
    Some(value.trim().trim_end_matches(',').trim())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// `Int Value: N` from `esxcli system settings advanced list -o ...`.
pub fn parse_int_value(output: &str) -> Option<i64> {
    scalar_after(output, "Int Value", ':')?.parse().ok()
}

/// `value = N,` from `vim-cmd hostsvc/advopt/view ...`.
pub fn parse_vim_cmd_int(output: &str) -> Option<i64> {
    scalar_after(output, "value =", '=')?.parse().ok()
}

/// `value = false,` from `vim-cmd hostsvc/advopt/view ...`.
pub fn parse_vim_cmd_bool(output: &str) -> Option<bool> {
    scalar_after(output, "value", '=').and_then(parse_bool)
}

/// `Allow Promiscuous: false` style lines from the vSwitch security policy.
pub fn parse_vswitch_policy(output: &str, key: &str) -> Option<bool> {
    scalar_after(output, key, ':').and_then(parse_bool)
}

/// The host image profile acceptance level.
///
/// Only a single identifier-shaped token on the first non-blank line is
/// accepted; error text or anything multi-word is absent.
pub fn parse_acceptance_level(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(line.to_string())
    } else {
        None
    }
}

/// Every `key: value` line of a block. Later duplicates win.
pub fn parse_key_value_block(output: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// `Remote Host` from `esxcli system syslog config get`, `<none>` when missing.
pub fn parse_syslog_remote_host(output: &str) -> String {
    parse_key_value_block(output)
        .shift_remove("Remote Host")
        .unwrap_or_else(|| SYSLOG_NONE.to_string())
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-' || c.is_whitespace())
}

/// Rows of `esxcli software vib list`.
pub fn parse_vib_list(output: &str) -> Vec<Vib> {
    output
        .lines()
        .skip_while(|line| !line.contains("Acceptance Level"))
        .skip(1)
        .filter(|line| !line.trim().is_empty() && !is_separator_row(line))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            (fields.len() >= 4).then(|| Vib::new(fields[0], fields[3]))
        })
        .collect()
}

/// Rows of `esxcli network vswitch standard portgroup list`.
///
/// Columns are name, virtual switch, active clients and VLAN id. The name may
/// contain spaces so it is everything before the last three fields.
pub fn parse_port_groups(output: &str) -> Vec<PortGroup> {
    output
        .lines()
        .skip_while(|line| !line.trim().starts_with("----"))
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let vlan_id = fields[fields.len() - 1].parse::<u16>().ok()?;
            let name = fields[..fields.len() - 3].join(" ");
            Some(PortGroup::new(name, vlan_id))
        })
        .collect()
}

/// `[datastore] dir/vm.vmx` to `/vmfs/volumes/datastore/dir/vm.vmx`.
///
/// Paths that are not in datastore notation are returned unchanged.
pub fn datastore_path_to_absolute(raw: &str) -> String {
    let rewritten = raw.strip_prefix('[').and_then(|rest| {
        let (datastore, relative) = rest.split_once(']')?;
        Some(format!("/vmfs/volumes/{}/{}", datastore, relative.trim()))
    });
    rewritten.unwrap_or_else(|| raw.to_string())
}

/// Rows of `vim-cmd vmsvc/getallvms`.
pub fn parse_vm_inventory(output: &str) -> Vec<VmDescriptor> {
    output
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("Vmid")
        })
        .filter_map(parse_vm_row)
        .collect()
}

/// The path is anchored on the `.vmx` token, so a VM name containing `[`
/// does not shift the datastore.
fn parse_vm_row(line: &str) -> Option<VmDescriptor> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let id = *tokens.first()?;
    id.parse::<i64>().ok()?;

    let vmx_token = tokens.iter().skip(1).position(|t| t.contains(".vmx"))? + 1;
    let path_start = tokens[1..=vmx_token]
        .iter()
        .rposition(|t| t.starts_with('['))?
        + 1;
    let name = tokens[1..path_start].join(" ");
    let rest = tokens[path_start..].join(" ");
    let vmx_end = rest.find(".vmx")? + ".vmx".len();

    Some(VmDescriptor::new(
        id,
        name,
        datastore_path_to_absolute(&rest[..vmx_end]),
    ))
}

/// Value of `key` in the output of `grep "key" file.vmx`.
///
/// Commented lines and lines whose left-hand side is a different key (grep
/// matches substrings) are ignored.
pub fn parse_vmx_setting(output: &str, key: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(lhs, _)| lhs.trim() == key)
        .map(|(_, rhs)| rhs.trim().trim_matches('"').trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADVANCED_LIST: &str = r#"   Path: /Mem/ShareForceSalting
   Type: integer
   Int Value: 2
   Default Int Value: 2
   Min Value: 0
   Max Value: 2
   String Value:
   Default String Value:
   Valid Characters:
   Description: Sharing of pages with different salt values
"#;

    const ADVOPT_VIEW: &str = r#"(vim.option.OptionValue) [
   (vim.option.OptionValue) {
      key = "Security.AccountLockFailures",
      value = 5
   }
]
"#;

    const VIB_LIST: &str = r#"Name                           Version                              Vendor  Acceptance Level  Install Date  Platforms
-----------------------------  -----------------------------------  ------  ----------------  ------------  ---------
atlantic                       1.0.3.0-8vmw.800.1.0.20513097        VMW     VMwareCertified   2023-05-01    host
bnxtnet                        222.0.62.0-1OEM.800.1.0.20613240     BCM     VMwareCertified   2023-05-01    host
sketchy-driver                 0.1-1                                ACME    CommunitySupported 2023-05-01   host
short row
"#;

    const PORTGROUP_LIST: &str = r#"Name                Virtual Switch  Active Clients  VLAN ID
------------------  --------------  --------------  -------
Management Network  vSwitch0                     1        0
VM Network          vSwitch0                     3       10
Trunk               vSwitch0                     0     4095
Broken              vSwitch0                     0      abc
"#;

    const GETALLVMS: &str = r#"Vmid      Name                        File                          Guest OS          Version   Annotation
1      Windows1          [nvme_ssd] Windows1/Windows1.vmx     windows9_64Guest   vmx-19
2      db primary        [ds 2] db/db primary.vmx           rhel9_64Guest      vmx-20    prod database
x      not-a-vm          [ds1] x/x.vmx                       otherGuest         vmx-19
3      orphan            missing-path                        otherGuest         vmx-19
"#;

    #[test]
    fn test_parse_int_value() {
        assert_eq!(parse_int_value(ADVANCED_LIST), Some(2));
        assert_eq!(parse_int_value("Int Value: 600"), Some(600));
        assert_eq!(parse_int_value("Int Value: abc"), None);
        assert_eq!(parse_int_value("Default Int Value: 2"), None);
        assert_eq!(parse_int_value(""), None);
    }

    #[test]
    fn test_parse_vim_cmd_int() {
        assert_eq!(parse_vim_cmd_int(ADVOPT_VIEW), Some(5));
        assert_eq!(parse_vim_cmd_int("value = 900,"), Some(900));
        assert_eq!(parse_vim_cmd_int("key = \"x\""), None);
    }

    #[test]
    fn test_parse_vim_cmd_bool() {
        assert_eq!(parse_vim_cmd_bool("      value = false,"), Some(false));
        assert_eq!(parse_vim_cmd_bool("value = True"), Some(true));
        assert_eq!(parse_vim_cmd_bool("value = maybe"), None);
        assert_eq!(parse_vim_cmd_bool("nothing here"), None);
    }

    #[test]
    fn test_parse_vswitch_policy() {
        let output = "   Allow Promiscuous: false\n   Allow MAC Address Change: true\n   Allow Forged Transmits: false\n";
        assert_eq!(parse_vswitch_policy(output, "Allow Promiscuous"), Some(false));
        assert_eq!(
            parse_vswitch_policy(output, "Allow MAC Address Change"),
            Some(true)
        );
        assert_eq!(parse_vswitch_policy(output, "Allow Other"), None);
        assert_eq!(parse_vswitch_policy("Allow Promiscuous: 0", "Allow Promiscuous"), None);
    }

    #[test]
    fn test_parse_acceptance_level() {
        assert_eq!(
            parse_acceptance_level("\nPartnerSupported\n"),
            Some("PartnerSupported".to_string())
        );
        assert_eq!(parse_acceptance_level("Error: permission denied"), None);
        assert_eq!(parse_acceptance_level("   \n"), None);
    }

    #[test]
    fn test_parse_key_value_block_last_wins() {
        let map = parse_key_value_block("A: 1\nB: two: parts\nA: 3\nno colon\n");
        assert_eq!(map.get("A").map(String::as_str), Some("3"));
        assert_eq!(map.get("B").map(String::as_str), Some("two: parts"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_parse_syslog_remote_host() {
        let output = "   Local Log Output: /scratch/log\n   Remote Host: tcp://10.0.0.9:514\n";
        assert_eq!(parse_syslog_remote_host(output), "tcp://10.0.0.9:514");
        assert_eq!(parse_syslog_remote_host("   Remote Host: <none>"), SYSLOG_NONE);
        assert_eq!(parse_syslog_remote_host("garbage"), SYSLOG_NONE);
    }

    #[test]
    fn test_parse_vib_list() {
        let vibs = parse_vib_list(VIB_LIST);
        assert_eq!(
            vibs,
            vec![
                Vib::new("atlantic", "VMwareCertified"),
                Vib::new("bnxtnet", "VMwareCertified"),
                Vib::new("sketchy-driver", "CommunitySupported"),
            ]
        );
        assert!(parse_vib_list("no header at all\nfoo bar baz qux").is_empty());
    }

    #[test]
    fn test_parse_port_groups() {
        let groups = parse_port_groups(PORTGROUP_LIST);
        assert_eq!(
            groups,
            vec![
                PortGroup::new("Management Network", 0),
                PortGroup::new("VM Network", 10),
                PortGroup::new("Trunk", 4095),
            ]
        );
    }

    #[test]
    fn test_datastore_path_to_absolute() {
        assert_eq!(
            datastore_path_to_absolute("[ds1] sub/vm.vmx"),
            "/vmfs/volumes/ds1/sub/vm.vmx"
        );
        assert_eq!(datastore_path_to_absolute("/already/abs.vmx"), "/already/abs.vmx");
        assert_eq!(datastore_path_to_absolute("[unterminated"), "[unterminated");
    }

    #[test]
    fn test_parse_vm_inventory() {
        let vms = parse_vm_inventory(GETALLVMS);
        assert_eq!(
            vms,
            vec![
                VmDescriptor::new(
                    "1",
                    "Windows1",
                    "/vmfs/volumes/nvme_ssd/Windows1/Windows1.vmx"
                ),
                VmDescriptor::new("2", "db primary", "/vmfs/volumes/ds 2/db/db primary.vmx"),
            ]
        );
    }

    #[test]
    fn test_vm_name_with_brackets() {
        let output = "Vmid   Name   File   Guest OS   Version   Annotation\n\
                      7      [old] web 2   [ds1] web/web.vmx   otherGuest   vmx-19\n";
        assert_eq!(
            parse_vm_inventory(output),
            vec![VmDescriptor::new("7", "[old] web 2", "/vmfs/volumes/ds1/web/web.vmx")]
        );
    }

    #[test]
    fn test_parse_vmx_setting() {
        let key = "log.rotateSize";
        assert_eq!(
            parse_vmx_setting("log.rotateSize = \"1000000\"\n", key),
            Some("1000000".to_string())
        );
        assert_eq!(parse_vmx_setting("#log.rotateSize = \"1\"\n", key), None);
        assert_eq!(
            parse_vmx_setting("log.rotateSizeMax = \"5\"\nlog.rotateSize=\"20\"", key),
            Some("20".to_string())
        );
        assert_eq!(parse_vmx_setting("", key), None);
    }
}
