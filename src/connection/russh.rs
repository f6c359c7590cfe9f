//! Russh connection module
//!
//! SSH transport built on the pure Rust `russh` client. A [`RusshConnection`]
//! is one authenticated session; commands each run on their own channel.

use async_trait::async_trait;
use russh::client::{Handle, Handler};
use russh::keys::key::PublicKey;
use russh::keys::load_secret_key;
use russh::ChannelMsg;
use russh_keys::agent::client::AgentClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use super::config::{expand_path, ConnectionDefaults};
use super::{
    CommandResult, Connection, ConnectionError, ConnectionResult, Credentials, ExecuteOptions,
    HostTarget, RusshError,
};

/// Result of host key verification
#[derive(Debug, Clone, PartialEq)]
enum HostKeyStatus {
    /// Key matches known_hosts entry
    Verified,
    /// Host not found in known_hosts (first connection)
    Unknown,
    /// Key doesn't match known_hosts entry
    Mismatch,
}

/// Client handler for russh with host key verification
struct ClientHandler {
    /// The hostname we're connecting to (for known_hosts lookup)
    host: String,
    /// The port we're connecting to
    port: u16,
    /// Known hosts entries
    known_hosts: Vec<KnownHostEntry>,
    /// Whether to accept hosts missing from known_hosts
    accept_unknown: bool,
}

/// A parsed entry from known_hosts file
#[derive(Debug, Clone)]
struct KnownHostEntry {
    /// Hostnames/patterns this entry applies to
    patterns: Vec<String>,
    /// The public key
    key: PublicKey,
}

impl ClientHandler {
    fn new(host: &str, port: u16, known_hosts_path: Option<PathBuf>, accept_unknown: bool) -> Self {
        let known_hosts = known_hosts_path
            .as_deref()
            .map(Self::load_known_hosts)
            .unwrap_or_default();
        Self {
            host: host.to_string(),
            port,
            known_hosts,
            accept_unknown,
        }
    }

    fn load_known_hosts(path: &Path) -> Vec<KnownHostEntry> {
        if !path.exists() {
            return Vec::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to read known_hosts file");
                return Vec::new();
            }
        };

        let entries: Vec<KnownHostEntry> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Self::parse_known_hosts_line)
            .collect();

        debug!(entry_count = %entries.len(), "Loaded known_hosts entries");
        entries
    }

    /// Parse `hostname[,hostname...] keytype base64key [comment]`
    fn parse_known_hosts_line(line: &str) -> Option<KnownHostEntry> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return None;
        }

        let patterns = split_host_patterns(parts[0]);

        let key_bytes =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, parts[2]).ok()?;

        match russh::keys::key::parse_public_key(&key_bytes, None) {
            Ok(key) => Some(KnownHostEntry { patterns, key }),
            Err(_) => {
                trace!(key_type = %parts[1], "Failed to parse key, skipping entry");
                None
            }
        }
    }

    fn verify_host_key(&self, server_key: &PublicKey) -> HostKeyStatus {
        for entry in &self.known_hosts {
            if entry
                .patterns
                .iter()
                .any(|p| pattern_matches(p, &self.host, self.port))
            {
                if entry.key.fingerprint() == server_key.fingerprint() {
                    return HostKeyStatus::Verified;
                }
                return HostKeyStatus::Mismatch;
            }
        }

        HostKeyStatus::Unknown
    }
}

fn split_host_patterns(field: &str) -> Vec<String> {
    field.split(',').map(|s| s.to_string()).collect()
}

/// Check if a known_hosts pattern matches the host
fn pattern_matches(pattern: &str, host: &str, port: u16) -> bool {
    // [host]:port
    if let Some(rest) = pattern.strip_prefix('[') {
        if let Some(end_bracket) = rest.find(']') {
            let pattern_host = &rest[..end_bracket];
            let pattern_port = rest
                .get(end_bracket + 2..)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(22);
            return pattern_host == host && pattern_port == port;
        }
    }

    if port == 22 && pattern == host {
        return true;
    }

    if pattern.contains('*') || pattern.contains('?') {
        return wildcard_match(pattern, host);
    }

    false
}

/// `*` and `?` matching for known_hosts patterns
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut pattern_chars = pattern.chars().peekable();
    let mut text_chars = text.chars();

    while let Some(pc) = pattern_chars.next() {
        match pc {
            '*' => {
                if pattern_chars.peek().is_none() {
                    return true;
                }
                let rest_pattern: String = pattern_chars.collect();
                let rest_text: String = text_chars.collect();
                return rest_text
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(rest_text.len()))
                    .any(|i| wildcard_match(&rest_pattern, &rest_text[i..]));
            }
            '?' => {
                if text_chars.next().is_none() {
                    return false;
                }
            }
            c => {
                if text_chars.next() != Some(c) {
                    return false;
                }
            }
        }
    }

    text_chars.next().is_none()
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = RusshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.verify_host_key(server_public_key) {
            HostKeyStatus::Verified => {
                debug!(host = %self.host, "Host key verified against known_hosts");
                Ok(true)
            }
            HostKeyStatus::Unknown if self.accept_unknown => {
                debug!(host = %self.host, "Host not found in known_hosts, accepting");
                Ok(true)
            }
            HostKeyStatus::Unknown => {
                warn!(host = %self.host, "Host not found in known_hosts, rejecting");
                Ok(false)
            }
            HostKeyStatus::Mismatch => {
                warn!(
                    host = %self.host,
                    "HOST KEY VERIFICATION FAILED! Server key does not match known_hosts entry."
                );
                Ok(false)
            }
        }
    }
}

/// One authenticated SSH session.
pub struct RusshConnection {
    /// `user@host:port`
    identifier: String,
    /// Russh client handle, taken on close
    handle: RwLock<Option<Handle<ClientHandler>>>,
}

impl RusshConnection {
    /// Connect and authenticate.
    pub async fn connect(
        target: &HostTarget,
        defaults: &ConnectionDefaults,
    ) -> ConnectionResult<Self> {
        let identifier = target.identifier();
        let timeout = defaults.connect_timeout_duration();

        debug!(
            host = %target.address,
            port = %target.port,
            user = %target.user,
            auth = %target.credentials.method(),
            "Connecting via SSH (russh)"
        );

        let mut config = russh::client::Config::default();
        config.inactivity_timeout = Some(Duration::from_secs(
            defaults.command_timeout.max(defaults.connect_timeout),
        ));
        let config = Arc::new(config);

        let addr = format!("{}:{}", target.address, target.port);
        let socket = tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&addr))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout.as_secs()))?
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
            })?;

        socket.set_nodelay(true).map_err(|e| {
            ConnectionError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        let handler = ClientHandler::new(
            &target.address,
            target.port,
            defaults.known_hosts_path(),
            !defaults.strict_host_key_checking,
        );

        let handshake = russh::client::connect_stream(config, socket, handler);
        let mut session = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| ConnectionError::Timeout(timeout.as_secs()))?
            .map_err(|e| match e {
                RusshError(russh::Error::UnknownKey) => {
                    ConnectionError::HostKeyRejected(target.address.clone())
                }
                RusshError(other) => {
                    ConnectionError::ConnectionFailed(format!("SSH handshake failed: {}", other))
                }
            })?;

        Self::authenticate(&mut session, &target.user, &target.credentials).await?;

        debug!(identifier = %identifier, "SSH connection established");

        Ok(Self {
            identifier,
            handle: RwLock::new(Some(session)),
        })
    }

    async fn authenticate(
        session: &mut Handle<ClientHandler>,
        user: &str,
        credentials: &Credentials,
    ) -> ConnectionResult<()> {
        match credentials {
            Credentials::Password(password) => {
                let authenticated = session
                    .authenticate_password(user, password)
                    .await
                    .map_err(|e| {
                        ConnectionError::AuthenticationFailed(format!(
                            "Password authentication failed: {}",
                            e
                        ))
                    })?;

                if authenticated {
                    debug!("Authenticated using password");
                    Ok(())
                } else {
                    Err(ConnectionError::AuthenticationFailed(format!(
                        "password rejected for user {}",
                        user
                    )))
                }
            }
            Credentials::PrivateKey { path, passphrase } => {
                let key_path = expand_path(&path.to_string_lossy());
                Self::try_key_auth(session, user, &key_path, passphrase.as_deref()).await?;
                debug!(key = %key_path.display(), "Authenticated using key");
                Ok(())
            }
            Credentials::Agent => {
                Self::try_agent_auth(session, user).await?;
                debug!("Authenticated using SSH agent");
                Ok(())
            }
        }
    }

    /// Try each identity offered by the agent behind `SSH_AUTH_SOCK`.
    async fn try_agent_auth(
        session: &mut Handle<ClientHandler>,
        user: &str,
    ) -> ConnectionResult<()> {
        let mut agent = AgentClient::connect_env().await.map_err(|e| {
            ConnectionError::AuthenticationFailed(format!("Failed to connect to SSH agent: {}", e))
        })?;

        let identities = agent.request_identities().await.map_err(|e| {
            ConnectionError::AuthenticationFailed(format!("Failed to get agent identities: {}", e))
        })?;

        if identities.is_empty() {
            return Err(ConnectionError::AuthenticationFailed(
                "SSH agent has no identities".to_string(),
            ));
        }

        debug!(identity_count = %identities.len(), "Found SSH agent identities");

        for identity in identities {
            let (returned_agent, result) = session
                .authenticate_future(user, identity.clone(), agent)
                .await;
            agent = returned_agent;

            match result {
                Ok(true) => return Ok(()),
                Ok(false) => trace!("Identity rejected, trying next"),
                Err(e) => trace!(error = %e, "Agent authentication attempt failed"),
            }
        }

        Err(ConnectionError::AuthenticationFailed(
            "All SSH agent identities rejected".to_string(),
        ))
    }

    /// Load a private key (optionally encrypted) and offer it.
    async fn try_key_auth(
        session: &mut Handle<ClientHandler>,
        user: &str,
        key_path: &Path,
        passphrase: Option<&str>,
    ) -> ConnectionResult<()> {
        if !key_path.exists() {
            return Err(ConnectionError::AuthenticationFailed(format!(
                "Key file not found: {}",
                key_path.display()
            )));
        }

        let key_pair = load_secret_key(key_path, passphrase).map_err(|e| {
            ConnectionError::AuthenticationFailed(format!(
                "Failed to load key {}: {}",
                key_path.display(),
                e
            ))
        })?;

        let authenticated = session
            .authenticate_publickey(user, Arc::new(key_pair))
            .await
            .map_err(|e| {
                ConnectionError::AuthenticationFailed(format!(
                    "Key authentication failed for {}: {}",
                    key_path.display(),
                    e
                ))
            })?;

        if authenticated {
            Ok(())
        } else {
            Err(ConnectionError::AuthenticationFailed(format!(
                "key {} rejected for user {}",
                key_path.display(),
                user
            )))
        }
    }

    async fn run(&self, command: &str) -> ConnectionResult<CommandResult> {
        let handle_guard = self.handle.read().await;
        let handle = handle_guard
            .as_ref()
            .ok_or(ConnectionError::ConnectionClosed)?;

        let mut channel = handle.channel_open_session().await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to open channel: {}", e))
        })?;
        drop(handle_guard);

        channel.exec(true, command).await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to execute command: {}", e))
        })?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                // Extended data type 1 is stderr
                ChannelMsg::ExtendedData { ref data, ext } if ext == 1 => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        // Unknown exit status counts as failure
        let exit_code: i32 = exit_code.map(|e| e as i32).unwrap_or(i32::MAX);
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        trace!(exit_code = %exit_code, "Command completed");

        if exit_code == 0 {
            Ok(CommandResult::success(stdout, stderr))
        } else {
            Ok(CommandResult::failure(exit_code, stdout, stderr))
        }
    }
}

#[async_trait]
impl Connection for RusshConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn execute(
        &self,
        command: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        let options = options.unwrap_or_default();

        trace!(command = %command, "Executing remote command");

        match options.timeout {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), self.run(command))
                .await
                .map_err(|_| ConnectionError::Timeout(secs))?,
            None => self.run(command).await,
        }
    }

    async fn close(&self) -> ConnectionResult<()> {
        debug!(identifier = %self.identifier, "Closing SSH connection");

        let handle = self.handle.write().await.take();
        if let Some(handle) = handle {
            let _ = handle
                .disconnect(
                    russh::Disconnect::ByApplication,
                    "Connection closed by client",
                    "en",
                )
                .await;
        }

        Ok(())
    }
}

impl std::fmt::Debug for RusshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusshConnection")
            .field("identifier", &self.identifier)
            .finish()
    }
}
