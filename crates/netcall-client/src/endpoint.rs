//! QUIC client endpoint.
//!
//! `ClientEndpoint` wraps a quinn client endpoint configured with a trusted
//! certificate authority. Server certificates are validated against that CA
//! during connection establishment; a chain that does not validate aborts
//! the connection before any call can be made.

use std::net::SocketAddr;
use std::sync::Arc;

use rustls_pki_types::CertificateDer;
use tracing::info;

use netcall_proto::tls::config::build_client_tls_config;

use crate::connection::Connection;
use crate::error::{ClientError, Result};

/// A QUIC client endpoint that connects to netcall servers.
pub struct ClientEndpoint {
    endpoint: quinn::Endpoint,
}

impl ClientEndpoint {
    /// Create a client endpoint bound to an ephemeral port, trusting the
    /// given CA certificates for server authentication.
    pub fn new(ca_certs: Vec<CertificateDer<'static>>) -> Result<Self> {
        let rustls_config = build_client_tls_config(ca_certs)?;

        let quic_client_config = quinn::crypto::rustls::QuicClientConfig::try_from(rustls_config)
            .map_err(|e| ClientError::TlsConfig(format!("rustls→quinn: {e}")))?;

        let client_config = quinn::ClientConfig::new(Arc::new(quic_client_config));

        let bind_addr: SocketAddr = "0.0.0.0:0"
            .parse()
            .map_err(|e| ClientError::Endpoint(format!("bind address: {e}")))?;
        let mut endpoint =
            quinn::Endpoint::client(bind_addr).map_err(|e| ClientError::Endpoint(e.to_string()))?;
        endpoint.set_default_client_config(client_config);

        Ok(Self { endpoint })
    }

    /// Connect to a server, validating its certificate for `server_name`.
    ///
    /// The returned connection multiplexes any number of concurrent calls.
    pub async fn connect(&self, addr: SocketAddr, server_name: &str) -> Result<Connection> {
        let connecting = self.endpoint.connect(addr, server_name)?;
        let connection = connecting.await?;

        info!(remote = %connection.remote_address(), "connected to server");

        Ok(Connection::new(connection))
    }

    /// Gracefully shut down the endpoint.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"shutdown");
    }
}
