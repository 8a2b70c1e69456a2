//! TLS configuration builders for the QUIC server and client endpoints.
//!
//! Constructs `rustls::ServerConfig` and `rustls::ClientConfig` with
//! TLS 1.3 and the ring crypto provider.
//!
//! Trust model: the server presents a certificate chain and private key;
//! the client validates that chain against a caller-supplied CA bundle via
//! the standard webpki verifier. No client certificates — this protocol
//! authenticates the server only.

use std::sync::Arc;

use rustls::RootCertStore;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::{ProtoError, Result};

/// ALPN protocol identifier used by netcall.
pub const ALPN_NETCALL: &[u8] = b"netcall";

/// Build a `rustls::ServerConfig` from a certificate chain and private key.
pub fn build_server_tls_config(
    cert_chain: Vec<CertificateDer<'static>>,
    private_key: PrivateKeyDer<'static>,
) -> Result<rustls::ServerConfig> {
    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS13])
    .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
    .with_no_client_auth()
    .with_single_cert(cert_chain, private_key)
    .map_err(|e| ProtoError::TlsConfiguration(format!("server cert config: {e}")))?;

    // QUIC requires ALPN — use our protocol identifier.
    config.alpn_protocols = vec![ALPN_NETCALL.to_vec()];

    Ok(config)
}

/// Build a `rustls::ClientConfig` trusting the given CA certificates.
///
/// Server certificates are verified against this root store before any
/// call is permitted; a chain that does not validate aborts connection
/// establishment.
pub fn build_client_tls_config(
    ca_certs: Vec<CertificateDer<'static>>,
) -> Result<rustls::ClientConfig> {
    let mut roots = RootCertStore::empty();
    for cert in ca_certs {
        roots
            .add(cert)
            .map_err(|e| ProtoError::TlsConfiguration(format!("CA cert rejected: {e}")))?;
    }

    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS13])
    .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    // QUIC requires ALPN — use our protocol identifier.
    config.alpn_protocols = vec![ALPN_NETCALL.to_vec()];

    Ok(config)
}
