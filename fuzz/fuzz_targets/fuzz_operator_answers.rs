//! Fuzz target for operator answer validation.
//!
//! Accepted answers end up in remote shell commands, so whatever passes
//! validation must stay inside its allowed shape.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use esxguard::benchmark::remediation::{parse_loghost, parse_replacement_vlan, parse_selection};

#[derive(Debug, Arbitrary)]
struct Answer {
    text: String,
    list_len: u8,
}

fuzz_target!(|answer: Answer| {
    let len = usize::from(answer.list_len);
    for index in parse_selection(&answer.text, len) {
        assert!(index < len);
    }

    if let Some(vlan) = parse_replacement_vlan(&answer.text) {
        assert!(vlan > 1 && vlan < 4095);
    }

    if let Some(loghost) = parse_loghost(&answer.text, "tcp://192.168.1.10:514") {
        assert!(!loghost.contains('\''));
        assert!(!loghost.contains('"'));
    }
});
