//! Shared test utilities and fixtures for the esxguard test suite.
//!
//! This module provides:
//! - A scripted [`MockConnection`] standing in for an ESXi host
//! - A [`ScriptedOperator`] answering remediation prompts from a queue
//! - Captured ESXi command output used as fixtures
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use esxguard::benchmark::commands;
use esxguard::benchmark::{BenchmarkError, BenchmarkResult, Operator};
use esxguard::connection::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions,
};

// ============================================================================
// Mock Connection Implementation
// ============================================================================

/// A mock ESXi host.
///
/// Commands are answered from a map of exact command strings; anything not
/// scripted gets the default result (empty stdout, exit 0). Every command is
/// recorded in order.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockConnection::new("10.0.0.5");
/// mock.respond("esxcli software acceptance get", "PartnerSupported\n");
///
/// let result = mock.execute("esxcli software acceptance get", None).await.unwrap();
/// assert_eq!(result.stdout, "PartnerSupported\n");
/// assert_eq!(mock.command_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockConnection {
    identifier: String,
    commands_executed: RwLock<Vec<String>>,
    timeouts: RwLock<Vec<Option<u64>>>,
    command_results: RwLock<HashMap<String, CommandResult>>,
    default_result: RwLock<CommandResult>,
    should_fail: AtomicBool,
    fail_after_n: AtomicU32,
    command_count: AtomicU32,
}

impl MockConnection {
    /// Create a new mock connection with the given identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            commands_executed: RwLock::new(Vec::new()),
            timeouts: RwLock::new(Vec::new()),
            command_results: RwLock::new(HashMap::new()),
            default_result: RwLock::new(CommandResult::success(String::new(), String::new())),
            should_fail: AtomicBool::new(false),
            fail_after_n: AtomicU32::new(u32::MAX),
            command_count: AtomicU32::new(0),
        }
    }

    /// Set the result for a specific command.
    pub fn set_command_result(&self, command: impl Into<String>, result: CommandResult) {
        self.command_results.write().insert(command.into(), result);
    }

    /// Answer `command` with `stdout` and exit 0.
    pub fn respond(&self, command: impl Into<String>, stdout: &str) {
        self.set_command_result(command, CommandResult::success(stdout.to_string(), String::new()));
    }

    /// Set the default result for commands not explicitly configured.
    pub fn set_default_result(&self, result: CommandResult) {
        *self.default_result.write() = result;
    }

    /// Configure the mock to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Configure the mock to fail after N successful operations.
    pub fn fail_after(&self, n: u32) {
        self.fail_after_n.store(n, Ordering::SeqCst);
    }

    /// Get the number of commands executed.
    pub fn command_count(&self) -> u32 {
        self.command_count.load(Ordering::SeqCst)
    }

    /// Get all commands that were executed.
    pub fn get_commands(&self) -> Vec<String> {
        self.commands_executed.read().clone()
    }

    /// Timeout passed with each command, in order.
    pub fn get_timeouts(&self) -> Vec<Option<u64>> {
        self.timeouts.read().clone()
    }

    /// Commands that change the host, in order.
    pub fn write_commands(&self) -> Vec<String> {
        self.get_commands()
            .into_iter()
            .filter(|c| {
                c.contains(" set ")
                    || c.contains("advopt/update")
                    || c.starts_with("sed -i")
                    || c.starts_with("echo ")
                    || c.contains("vmsvc/reload")
                    || c.contains("syslog reload")
            })
            .collect()
    }

    /// Forget recorded commands and failure settings, keep the script.
    pub fn reset(&self) {
        self.commands_executed.write().clear();
        self.timeouts.write().clear();
        self.command_count.store(0, Ordering::SeqCst);
        self.should_fail.store(false, Ordering::SeqCst);
        self.fail_after_n.store(u32::MAX, Ordering::SeqCst);
    }

    fn check_should_fail(&self) -> bool {
        if self.should_fail.load(Ordering::SeqCst) {
            return true;
        }
        let count = self.command_count.load(Ordering::SeqCst);
        let fail_after = self.fail_after_n.load(Ordering::SeqCst);
        count >= fail_after
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        if self.check_should_fail() {
            return Err(ConnectionError::ConnectionFailed(
                "Mock connection failed".to_string(),
            ));
        }

        self.command_count.fetch_add(1, Ordering::SeqCst);
        self.commands_executed.write().push(command.to_string());
        self.timeouts.write().push(options.and_then(|o| o.timeout));

        // Check for specific command result
        if let Some(result) = self.command_results.read().get(command) {
            return Ok(result.clone());
        }

        // Return default result
        Ok(self.default_result.read().clone())
    }

    async fn close(&self) -> ConnectionResult<()> {
        Ok(())
    }
}

// ============================================================================
// Scripted Operator
// ============================================================================

/// Answers prompts from a queue and records what it was shown.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    listings: Mutex<Vec<Vec<String>>>,
    rejections: Mutex<Vec<String>>,
    notices: Mutex<Vec<String>>,
    unattended: bool,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// An operator that must never be asked anything.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Nobody at the terminal, as in an unattended `--fix` run.
    pub fn unattended() -> Self {
        Self {
            unattended: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn listings(&self) -> Vec<Vec<String>> {
        self.listings.lock().clone()
    }

    pub fn rejections(&self) -> Vec<String> {
        self.rejections.lock().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().clone()
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.lock().len()
    }

    fn next_answer(&self, prompt: &str) -> BenchmarkResult<String> {
        self.prompts.lock().push(prompt.to_string());
        self.answers
            .lock()
            .pop_front()
            .ok_or_else(|| BenchmarkError::Prompt(format!("no scripted answer for '{}'", prompt)))
    }
}

impl Operator for ScriptedOperator {
    fn select_targets(&self, prompt: &str, items: &[String]) -> BenchmarkResult<String> {
        self.listings.lock().push(items.to_vec());
        self.next_answer(prompt)
    }

    fn input(&self, prompt: &str, _default: Option<&str>) -> BenchmarkResult<String> {
        self.next_answer(prompt)
    }

    fn reject(&self, message: &str) {
        self.rejections.lock().push(message.to_string());
    }

    fn notice(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }

    fn is_attended(&self) -> bool {
        !self.unattended
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const VIB_LIST_CLEAN: &str = "\
Name                           Version                               Vendor  Acceptance Level  Install Date  Platforms
-----------------------------  ------------------------------------  ------  ----------------  ------------  ---------
esx-base                       8.0.2-0.0.22380479                    VMware  VMwareCertified   2023-09-21    host
vmkusb                         0.1-18vmw.802.0.0.22380479            VMW     VMwareCertified   2023-09-21    host
lsuv2-intelv2-nvme-vmd-plugin  2.7.2173-1OEM.700.1.0.15843807        INT     VMwareAccepted    2023-09-21    host
";

pub const VIB_LIST_COMMUNITY: &str = "\
Name                           Version                               Vendor  Acceptance Level  Install Date  Platforms
-----------------------------  ------------------------------------  ------  ----------------  ------------  ---------
esx-base                       8.0.2-0.0.22380479                    VMware  VMwareCertified   2023-09-21    host
net-community                  1.2.0.0-1vmw.800.1.0.20143090         VMW     CommunitySupported 2024-01-10   host
";

pub fn advanced_list(path: &str, value: i64) -> String {
    format!(
        "   Path: {}\n   Type: integer\n   Int Value: {}\n   Default Int Value: 0\n   Min Value: 0\n   Max Value: 86400\n",
        path, value
    )
}

pub fn advopt_view(key: &str, value: &str) -> String {
    format!(
        "(vim.option.OptionValue) [\n   (vim.option.OptionValue) {{\n      key = \"{}\",\n      value = {}\n   }}\n]\n",
        key, value
    )
}

pub fn syslog_config(remote_host: &str) -> String {
    format!(
        "   Local Log Output: /scratch/log\n   Local Log Output Is Configured: false\n   Local Log Output Is Persistent: true\n   Remote Host: {}\n   Log Level: error\n",
        remote_host
    )
}

pub fn vswitch_policy(promiscuous: bool, mac_changes: bool, forged: bool) -> String {
    format!(
        "   Allow Promiscuous: {}\n   Allow MAC Address Change: {}\n   Allow Forged Transmits: {}\n",
        promiscuous, mac_changes, forged
    )
}

pub const PORTGROUPS_CLEAN: &str = "\
Name                Virtual Switch  Active Clients  VLAN ID
------------------  --------------  --------------  -------
Management Network  vSwitch0                     1       10
VM Network          vSwitch0                     2       20
";

pub const PORTGROUPS_DIRTY: &str = "\
Name                Virtual Switch  Active Clients  VLAN ID
------------------  --------------  --------------  -------
Management Network  vSwitch0                     1        0
VM Network          vSwitch0                     2       20
Trunk               vSwitch0                     0     4095
";

pub const VM_LIST_WINDOWS1: &str = "\
Vmid    Name                 File                     Guest OS          Version   Annotation
1      Windows1   [nvme_ssd] Windows1/Windows1.vmx   windows9_64Guest   vmx-19
";

pub const WINDOWS1_VMX: &str = "/vmfs/volumes/nvme_ssd/Windows1/Windows1.vmx";

pub const VM_LIST_TWO: &str = "\
Vmid    Name                 File                     Guest OS          Version   Annotation
1      Windows1   [nvme_ssd] Windows1/Windows1.vmx   windows9_64Guest   vmx-19
4      db 01      [ds2] db01/db01.vmx                 ubuntu64Guest      vmx-19    Primary database
";

pub const DB01_VMX: &str = "/vmfs/volumes/ds2/db01/db01.vmx";

/// Script every read a full audit makes so that all rules pass.
pub fn script_compliant_host(mock: &MockConnection) {
    mock.respond(commands::ACCEPTANCE_GET, "PartnerSupported\n");
    mock.respond(commands::VIB_LIST, VIB_LIST_CLEAN);

    for (path, value) in [
        ("/Mem/ShareForceSalting", 2),
        ("/UserVars/DcuiTimeOut", 600),
        ("/UserVars/ESXiShellInteractiveTimeOut", 300),
        ("/UserVars/ESXiShellTimeOut", 3600),
    ] {
        mock.respond(commands::advanced_get(path), &advanced_list(path, value));
    }

    mock.respond(
        commands::advopt_view("Config.HostAgent.plugins.solo.enableMob"),
        &advopt_view("Config.HostAgent.plugins.solo.enableMob", "false"),
    );
    mock.respond(
        commands::advopt_view("Security.AccountLockFailures"),
        &advopt_view("Security.AccountLockFailures", "5"),
    );
    mock.respond(
        commands::advopt_view("Security.AccountUnlockTime"),
        &advopt_view("Security.AccountUnlockTime", "900"),
    );

    mock.respond(commands::SYSLOG_GET, &syslog_config("tcp://10.0.0.9:514"));
    mock.respond(
        commands::vswitch_security_get("vSwitch0"),
        &vswitch_policy(false, false, false),
    );
    mock.respond(commands::PORTGROUP_LIST, PORTGROUPS_CLEAN);

    mock.respond(commands::VM_LIST, VM_LIST_WINDOWS1);
    for (key, value) in [
        ("RemoteDisplay.maxConnections", "1"),
        ("isolation.tools.diskShrink.disable", "TRUE"),
        ("isolation.tools.diskWiper.disable", "TRUE"),
        ("tools.guestlib.enableHostInfo", "FALSE"),
        ("log.keepOld", "10"),
        ("log.rotateSize", "1000000"),
    ] {
        mock.respond(
            commands::vmx_grep(key, WINDOWS1_VMX),
            &format!("{} = \"{}\"\n", key, value),
        );
    }
}
