//! TLS configuration for the QUIC transport.
//!
//! Shared TLS primitives used by both `netcall-server` and
//! `netcall-client`:
//!
//! - PEM loading (certificate chain, private key, CA bundle)
//! - rustls config builders (server presents a certificate; client
//!   validates it against a trusted CA — no client authentication)

pub mod config;
pub mod pem;
