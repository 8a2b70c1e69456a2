//! Device command sessions: connect, run one command, always disconnect.
//!
//! A session is transient and single-use: opened for one
//! `FetchDeviceConfig` call, handed exactly one command, and torn down
//! before the call returns — on every path. Failures during connect or
//! command submission are rendered into the response text (`"Error: "` +
//! description) rather than propagated as transport errors, so the RPC
//! layer reports call success either way.
//!
//! The [`DeviceConnector`] / [`DeviceSession`] traits are the seam between
//! the call handler and the concrete transport; [`SshConnector`] is the
//! production implementation over libssh2. All session I/O is blocking and
//! runs on a blocking worker (see `service`).

use std::io::Read;
use std::net::TcpStream;

use ssh2::Session;
use thiserror::Error;
use tracing::{info, warn};

use netcall_proto::wire::{DeviceTarget, SHOW_RUNNING_CONFIG};

/// Default SSH port when the device address carries no explicit port.
const DEFAULT_SSH_PORT: u16 = 22;

/// Errors from the device session layer.
///
/// These never cross the RPC boundary as errors; the session manager
/// renders them into response text.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device address must not be empty")]
    EmptyAddress,

    #[error("connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("authentication for {username} failed: {reason}")]
    Auth { username: String, reason: String },

    #[error("command execution failed: {reason}")]
    Command { reason: String },
}

/// An open command session to one device.
///
/// Implementations must tolerate `close` being the last call regardless of
/// whether `run_command` succeeded; the session manager invokes it exactly
/// once on every path.
pub trait DeviceSession: Send {
    /// Submit one command and capture its full textual output.
    fn run_command(&mut self, command: &str) -> Result<String, SessionError>;

    /// Tear the session down. Infallible by contract: teardown problems are
    /// logged, not reported, because the command outcome is already decided.
    fn close(&mut self);
}

/// Opens command sessions from device connection parameters.
pub trait DeviceConnector: Send + Sync {
    fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, SessionError>;
}

/// Fetch the running configuration of one device.
///
/// State machine: validate → connect → run `"show running-config"` →
/// close → render. `close` runs exactly once whenever `open` succeeded,
/// before the result text is built. Every failure is rendered as
/// `"Error: "` + description; success renders `"Running config:\n"` +
/// captured output.
pub fn fetch_running_config(connector: &dyn DeviceConnector, target: &DeviceTarget) -> String {
    if target.address.is_empty() {
        return format!("Error: {}", SessionError::EmptyAddress);
    }

    info!(
        platform = %target.platform,
        address = %target.address,
        username = %target.username,
        "connecting to device"
    );

    let mut session = match connector.open(target) {
        Ok(session) => session,
        Err(err) => {
            warn!(address = %target.address, error = %err, "device connect failed");
            return format!("Error: {err}");
        }
    };

    let outcome = session.run_command(SHOW_RUNNING_CONFIG);

    // Exactly one teardown, before the outcome is rendered.
    session.close();

    match outcome {
        Ok(output) => {
            info!(address = %target.address, bytes = output.len(), "captured running config");
            format!("Running config:\n{output}")
        }
        Err(err) => {
            warn!(address = %target.address, error = %err, "command failed");
            format!("Error: {err}")
        }
    }
}

/// Split a device address into host and port.
///
/// `host` alone gets the default SSH port; `host:port` is honored when the
/// suffix parses as a port number. IPv6 literals must be bracketed to carry
/// a port (`[2001:db8::1]:2222`); a bare address with more than one colon
/// is taken as an IPv6 host on the default port.
fn split_address(address: &str) -> (&str, u16) {
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, suffix)) = rest.split_once(']') {
            if let Some(port) = suffix.strip_prefix(':').and_then(|p| p.parse().ok()) {
                return (host, port);
            }
            return (host, DEFAULT_SSH_PORT);
        }
    }
    if address.matches(':').count() == 1 {
        if let Some((host, port)) = address.split_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host, port);
            }
        }
    }
    (address, DEFAULT_SSH_PORT)
}

/// Production connector: SSH with password authentication via libssh2.
#[derive(Debug, Default)]
pub struct SshConnector;

impl DeviceConnector for SshConnector {
    fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, SessionError> {
        let (host, port) = split_address(&target.address);

        let tcp = TcpStream::connect((host, port)).map_err(|e| SessionError::Connect {
            address: target.address.clone(),
            reason: e.to_string(),
        })?;

        let mut session = Session::new().map_err(|e| SessionError::Connect {
            address: target.address.clone(),
            reason: e.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| SessionError::Connect {
            address: target.address.clone(),
            reason: e.to_string(),
        })?;

        session
            .userauth_password(&target.username, &target.password)
            .map_err(|e| SessionError::Auth {
                username: target.username.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(SshSession { session }))
    }
}

struct SshSession {
    session: Session,
}

impl DeviceSession for SshSession {
    fn run_command(&mut self, command: &str) -> Result<String, SessionError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| SessionError::Command {
                reason: e.to_string(),
            })?;

        channel.exec(command).map_err(|e| SessionError::Command {
            reason: e.to_string(),
        })?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(|e| SessionError::Command {
                reason: e.to_string(),
            })?;

        // Channel teardown noise must not mask captured output.
        if let Err(err) = channel.wait_close() {
            warn!(error = %err, "command channel close reported an error");
        }

        Ok(output)
    }

    fn close(&mut self) {
        if let Err(err) = self
            .session
            .disconnect(None, "session complete", None)
        {
            warn!(error = %err, "device disconnect reported an error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn target(address: &str) -> DeviceTarget {
        DeviceTarget {
            platform: "cisco_ios".into(),
            address: address.into(),
            username: "admin".into(),
            password: "secret".into(),
        }
    }

    /// Scripted connector: either refuses to connect, or hands out sessions
    /// with a fixed command outcome, counting every close.
    struct MockConnector {
        connect_error: Option<String>,
        command_output: Result<String, String>,
        closes: Arc<AtomicUsize>,
    }

    struct MockSession {
        command_output: Result<String, String>,
        closes: Arc<AtomicUsize>,
    }

    impl DeviceConnector for MockConnector {
        fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, SessionError> {
            if let Some(reason) = &self.connect_error {
                return Err(SessionError::Connect {
                    address: target.address.clone(),
                    reason: reason.clone(),
                });
            }
            Ok(Box::new(MockSession {
                command_output: self.command_output.clone(),
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    impl DeviceSession for MockSession {
        fn run_command(&mut self, command: &str) -> Result<String, SessionError> {
            assert_eq!(command, SHOW_RUNNING_CONFIG);
            self.command_output
                .clone()
                .map_err(|reason| SessionError::Command { reason })
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn mock(
        connect_error: Option<&str>,
        command_output: Result<&str, &str>,
    ) -> (MockConnector, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            connect_error: connect_error.map(str::to_string),
            command_output: command_output
                .map(str::to_string)
                .map_err(str::to_string),
            closes: Arc::clone(&closes),
        };
        (connector, closes)
    }

    #[test]
    fn success_renders_output_and_closes_once() {
        let (connector, closes) = mock(None, Ok("hostname r1\n!"));
        let result = fetch_running_config(&connector, &target("192.0.2.1"));
        assert_eq!(result, "Running config:\nhostname r1\n!");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn command_failure_renders_error_and_closes_once() {
        let (connector, closes) = mock(None, Err("channel reset"));
        let result = fetch_running_config(&connector, &target("192.0.2.1"));
        assert!(result.starts_with("Error: "), "got: {result}");
        assert!(result.contains("channel reset"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_failure_renders_error_without_a_session() {
        let (connector, closes) = mock(Some("connection refused"), Ok(""));
        let result = fetch_running_config(&connector, &target("192.0.2.1"));
        assert!(result.starts_with("Error: "), "got: {result}");
        assert!(result.contains("connection refused"));
        // No session was ever opened, so there is nothing to close.
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_address_rejected_before_connecting() {
        let (connector, closes) = mock(None, Ok("unreachable"));
        let result = fetch_running_config(&connector, &target(""));
        assert!(result.starts_with("Error: "), "got: {result}");
        assert!(result.contains("address must not be empty"));
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn split_address_defaults_to_ssh_port() {
        assert_eq!(split_address("192.0.2.1"), ("192.0.2.1", 22));
    }

    #[test]
    fn split_address_honors_explicit_port() {
        assert_eq!(split_address("192.0.2.1:2222"), ("192.0.2.1", 2222));
    }

    #[test]
    fn split_address_keeps_non_numeric_suffix() {
        assert_eq!(split_address("router:mgmt"), ("router:mgmt", 22));
    }

    #[test]
    fn split_address_keeps_bare_ipv6_literal_whole() {
        assert_eq!(split_address("2001:db8::1"), ("2001:db8::1", 22));
    }

    #[test]
    fn split_address_honors_bracketed_ipv6_port() {
        assert_eq!(split_address("[2001:db8::1]:2222"), ("2001:db8::1", 2222));
        assert_eq!(split_address("[::1]"), ("::1", 22));
    }

    #[test]
    fn real_connector_reports_unreachable_address() {
        // Port 1 on localhost is refused without any listener. The failure
        // must render as response text, not a panic or transport error.
        let connector = SshConnector;
        let result = fetch_running_config(&connector, &target("127.0.0.1:1"));
        assert!(result.starts_with("Error: "), "got: {result}");
    }
}
