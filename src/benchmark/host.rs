//! Typed fact accessors for one ESXi host.

use tracing::{debug, trace, warn};

use super::commands;
use super::facts::{PortGroup, Vib, VmDescriptor};
use super::parsers;
use super::{BenchmarkError, BenchmarkResult};
use crate::connection::{CommandResult, Connection, ConnectionResult, ExecuteOptions};

/// vSwitch security policy switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityFlag {
    ForgedTransmits,
    MacChanges,
    Promiscuous,
}

impl SecurityFlag {
    /// Key in `policy security get` output.
    pub fn label(&self) -> &'static str {
        match self {
            SecurityFlag::ForgedTransmits => "Allow Forged Transmits",
            SecurityFlag::MacChanges => "Allow MAC Address Change",
            SecurityFlag::Promiscuous => "Allow Promiscuous",
        }
    }

    /// Option letter for `policy security set`.
    pub fn option(&self) -> char {
        match self {
            SecurityFlag::ForgedTransmits => 'f',
            SecurityFlag::MacChanges => 'm',
            SecurityFlag::Promiscuous => 'p',
        }
    }
}

/// Reads facts from, and writes settings to, one host.
///
/// Reads never fail on command output: a non-zero exit or text on stderr
/// still hands stdout to the parser. Only transport errors propagate.
pub struct EsxHost<'a> {
    connection: &'a dyn Connection,
    timeout: Option<u64>,
}

impl<'a> EsxHost<'a> {
    /// Commands run with the connection's own default timeout unless
    /// `timeout` is set.
    pub fn new(connection: &'a dyn Connection, timeout: Option<u64>) -> Self {
        Self {
            connection,
            timeout,
        }
    }

    fn options(&self) -> Option<ExecuteOptions> {
        self.timeout
            .map(|secs| ExecuteOptions::new().with_timeout(secs))
    }

    async fn exec(&self, command: &str) -> ConnectionResult<CommandResult> {
        trace!(host = %self.connection.identifier(), command = %command, "Running command");
        let result = self.connection.execute(command, self.options()).await?;

        if !result.stderr.trim().is_empty() {
            warn!(
                host = %self.connection.identifier(),
                command = %command,
                stderr = %result.stderr.trim(),
                "Command wrote to stderr"
            );
        }
        Ok(result)
    }

    /// Run a read-only command and return its stdout.
    pub async fn run(&self, command: &str) -> ConnectionResult<String> {
        let result = self.exec(command).await?;
        if !result.success {
            debug!(
                host = %self.connection.identifier(),
                command = %command,
                exit_code = result.exit_code,
                "Command exited non-zero"
            );
        }
        Ok(result.stdout)
    }

    /// Run a write command. A non-zero exit is an error.
    pub async fn write(&self, command: &str) -> BenchmarkResult<CommandResult> {
        debug!(host = %self.connection.identifier(), command = %command, "Applying change");
        let result = self.exec(command).await?;
        if result.success {
            Ok(result)
        } else {
            Err(BenchmarkError::CommandRejected {
                command: command.to_string(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    pub async fn acceptance_level(&self) -> ConnectionResult<Option<String>> {
        let out = self.run(commands::ACCEPTANCE_GET).await?;
        Ok(parsers::parse_acceptance_level(&out))
    }

    pub async fn vibs(&self) -> ConnectionResult<Vec<Vib>> {
        let out = self.run(commands::VIB_LIST).await?;
        Ok(parsers::parse_vib_list(&out))
    }

    /// Integer value of an `esxcli system settings advanced` option.
    pub async fn advanced_int(&self, path: &str) -> ConnectionResult<Option<i64>> {
        let out = self.run(&commands::advanced_get(path)).await?;
        Ok(parsers::parse_int_value(&out))
    }

    /// Integer value of a host agent advanced option.
    pub async fn host_agent_int(&self, key: &str) -> ConnectionResult<Option<i64>> {
        let out = self.run(&commands::advopt_view(key)).await?;
        Ok(parsers::parse_vim_cmd_int(&out))
    }

    /// Boolean value of a host agent advanced option.
    pub async fn host_agent_bool(&self, key: &str) -> ConnectionResult<Option<bool>> {
        let out = self.run(&commands::advopt_view(key)).await?;
        Ok(parsers::parse_vim_cmd_bool(&out))
    }

    pub async fn syslog_remote_host(&self) -> ConnectionResult<String> {
        let out = self.run(commands::SYSLOG_GET).await?;
        Ok(parsers::parse_syslog_remote_host(&out))
    }

    pub async fn vswitch_flag(
        &self,
        vswitch: &str,
        flag: SecurityFlag,
    ) -> ConnectionResult<Option<bool>> {
        let out = self.run(&commands::vswitch_security_get(vswitch)).await?;
        Ok(parsers::parse_vswitch_policy(&out, flag.label()))
    }

    pub async fn port_groups(&self) -> ConnectionResult<Vec<PortGroup>> {
        let out = self.run(commands::PORTGROUP_LIST).await?;
        Ok(parsers::parse_port_groups(&out))
    }

    pub async fn virtual_machines(&self) -> ConnectionResult<Vec<VmDescriptor>> {
        let out = self.run(commands::VM_LIST).await?;
        Ok(parsers::parse_vm_inventory(&out))
    }

    /// Value of `key` in a VM configuration file. `grep` exits 1 when the key
    /// is missing; that is an absent value, not an error.
    pub async fn vmx_setting(&self, path: &str, key: &str) -> ConnectionResult<Option<String>> {
        let out = self.run(&commands::vmx_grep(key, path)).await?;
        Ok(parsers::parse_vmx_setting(&out, key))
    }
}
