//! Fuzz target for the command output parsers.
//!
//! Every parser must accept arbitrary remote output without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use esxguard::benchmark::parsers;

fuzz_target!(|data: &[u8]| {
    let output = String::from_utf8_lossy(data);

    let _ = parsers::parse_int_value(&output);
    let _ = parsers::parse_vim_cmd_int(&output);
    let _ = parsers::parse_vim_cmd_bool(&output);
    let _ = parsers::parse_acceptance_level(&output);
    let _ = parsers::parse_vswitch_policy(&output, "Allow Promiscuous");
    let _ = parsers::parse_syslog_remote_host(&output);
    let _ = parsers::parse_key_value_block(&output);
    let _ = parsers::parse_vib_list(&output);
    let _ = parsers::parse_port_groups(&output);
    let _ = parsers::datastore_path_to_absolute(&output);
    let _ = parsers::parse_vmx_setting(&output, "RemoteDisplay.maxConnections");

    for vm in parsers::parse_vm_inventory(&output) {
        assert!(!vm.path.is_empty());
    }
});
