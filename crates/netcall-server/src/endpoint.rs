//! QUIC server endpoint.
//!
//! `ServerEndpoint` wraps a quinn server endpoint, binding to a fixed
//! address and serving RPC calls: one task per connection, one task per
//! call (bidirectional stream). All call state is call-local; the shared
//! [`AutomationService`] holds only its immutable extension seams.

use std::net::SocketAddr;
use std::sync::Arc;

use quinn::ConnectionError;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::{info, warn};

use netcall_proto::tls::config::build_server_tls_config;
use netcall_proto::wire::Request;

use crate::error::{Result, ServerError};
use crate::service::AutomationService;
use crate::stream_io;

/// A QUIC server endpoint serving the automation RPC surface.
pub struct ServerEndpoint {
    endpoint: quinn::Endpoint,
    service: Arc<AutomationService>,
}

impl ServerEndpoint {
    /// Bind a QUIC server to the given address.
    ///
    /// The certificate chain and private key are presented to every client;
    /// clients that fail to validate them never reach the dispatcher.
    pub fn bind(
        addr: SocketAddr,
        cert_chain: Vec<CertificateDer<'static>>,
        private_key: PrivateKeyDer<'static>,
        service: AutomationService,
    ) -> Result<Self> {
        let rustls_config = build_server_tls_config(cert_chain, private_key)?;

        let quic_server_config = quinn::crypto::rustls::QuicServerConfig::try_from(rustls_config)
            .map_err(|e| ServerError::TlsConfig(format!("rustls→quinn: {e}")))?;

        let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));

        let endpoint = quinn::Endpoint::server(server_config, addr)
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        info!(%addr, "server endpoint bound");

        Ok(Self {
            endpoint,
            service: Arc::new(service),
        })
    }

    /// Accept connections until the endpoint is closed.
    ///
    /// Each accepted connection gets its own task; within a connection,
    /// each call gets its own task. Connection-level faults are logged and
    /// never take down the accept loop.
    pub async fn serve(&self) {
        while let Some(incoming) = self.endpoint.accept().await {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                let connection = match incoming.await {
                    Ok(connection) => connection,
                    Err(err) => {
                        warn!(error = %err, "connection establishment failed");
                        return;
                    }
                };
                info!(remote = %connection.remote_address(), "accepted connection");
                if let Err(err) = handle_connection(connection, service).await {
                    warn!(error = %err, "connection ended with error");
                }
            });
        }
    }

    /// Returns the local address this endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))
    }

    /// Gracefully shut down the endpoint.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"shutdown");
    }
}

/// Serve calls on one connection until the peer goes away.
async fn handle_connection(
    connection: quinn::Connection,
    service: Arc<AutomationService>,
) -> Result<()> {
    loop {
        let (send, recv) = match connection.accept_bi().await {
            Ok(stream) => stream,
            // Peer or local shutdown ends the connection cleanly.
            Err(ConnectionError::ApplicationClosed(_)) | Err(ConnectionError::LocallyClosed) => {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(err) = handle_call(send, recv, service).await {
                warn!(error = %err, "call failed");
            }
        });
    }
}

/// Handle one call: read the request, dispatch, write the response.
async fn handle_call(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    service: Arc<AutomationService>,
) -> Result<()> {
    let request: Request = stream_io::read_message(&mut recv).await?;
    let response = service.dispatch(request).await;
    stream_io::write_message(&mut send, &response).await
}
