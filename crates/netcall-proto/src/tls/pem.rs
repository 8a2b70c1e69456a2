//! PEM parsing for certificates and private keys.
//!
//! Thin wrappers over `rustls-pemfile` that turn PEM bytes (or files) into
//! the owned rustls types the config builders consume. Key material passes
//! through without being logged or copied anywhere else.

use std::io::BufReader;
use std::path::Path;

use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::{ProtoError, Result};

/// Parse a PEM certificate chain (one or more CERTIFICATE blocks).
pub fn certs_from_pem(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(pem);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<std::io::Result<_>>()
        .map_err(|e| ProtoError::PemRead(format!("certificate parse: {e}")))?;
    if certs.is_empty() {
        return Err(ProtoError::PemRead("no certificates found in PEM".into()));
    }
    Ok(certs)
}

/// Parse a PEM private key (PKCS#8, SEC1, or PKCS#1).
pub fn key_from_pem(pem: &[u8]) -> Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(pem);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ProtoError::PemRead(format!("private key parse: {e}")))?
        .ok_or_else(|| ProtoError::PemRead("no private key found in PEM".into()))
}

/// Load a PEM certificate chain from a file.
pub fn certs_from_file(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let pem = std::fs::read(path)
        .map_err(|e| ProtoError::PemRead(format!("{}: {e}", path.display())))?;
    certs_from_pem(&pem)
}

/// Load a PEM private key from a file.
pub fn key_from_file(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let pem = std::fs::read(path)
        .map_err(|e| ProtoError::PemRead(format!("{}: {e}", path.display())))?;
    key_from_pem(&pem)
}
