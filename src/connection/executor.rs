//! Per-command SSH executor.
//!
//! Each call to [`SshExecutor::execute`] opens a new session, runs exactly one
//! command, reads its output and disconnects. The session is closed on every
//! path, including when the command itself fails or times out.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::config::ConnectionDefaults;
use super::russh::RusshConnection;
use super::{CommandResult, Connection, ConnectionResult, ExecuteOptions, HostTarget};

/// Runs commands against one host, one SSH session per command.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    target: HostTarget,
    defaults: ConnectionDefaults,
}

impl SshExecutor {
    /// Create an executor for a target. No connection is made yet.
    pub fn new(target: HostTarget, defaults: ConnectionDefaults) -> Self {
        Self { target, defaults }
    }

    /// The host this executor talks to.
    pub fn target(&self) -> &HostTarget {
        &self.target
    }
}

#[async_trait]
impl Connection for SshExecutor {
    fn identifier(&self) -> &str {
        &self.target.address
    }

    #[instrument(skip(self, options), fields(host = %self.target.address))]
    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        let options = match options {
            Some(opts) if opts.timeout.is_some() => opts,
            _ => ExecuteOptions::new().with_timeout(self.defaults.command_timeout),
        };

        let session = RusshConnection::connect(&self.target, &self.defaults).await?;
        let result = session.execute(command, Some(options)).await;

        if let Err(e) = session.close().await {
            debug!(error = %e, "Error while closing SSH session");
        }

        result
    }

    /// Sessions are closed after every command, so there is nothing to release.
    async fn close(&self) -> ConnectionResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Credentials;

    #[test]
    fn test_identifier_is_address() {
        let executor = SshExecutor::new(
            HostTarget::new("10.0.0.5", "root", Credentials::Agent),
            ConnectionDefaults::default(),
        );
        assert_eq!(executor.identifier(), "10.0.0.5");
        assert_eq!(executor.target().user, "root");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let defaults = ConnectionDefaults {
            connect_timeout: 1,
            ..ConnectionDefaults::default()
        };
        // Port 1 on localhost is closed in any sane test environment.
        let executor = SshExecutor::new(
            HostTarget::new("127.0.0.1", "root", Credentials::password("x")).with_port(1),
            defaults,
        );
        let err = executor.execute("true", None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::connection::ConnectionError::ConnectionFailed(_)
                | crate::connection::ConnectionError::Timeout(_)
        ));
    }
}
