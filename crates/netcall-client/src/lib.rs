//! netcall client-side core.
//!
//! The headless transport engine consumed by controller applications:
//!
//! - QUIC client endpoint (CA-validated server authentication)
//! - One multiplexed secure channel per server, one stream per call
//! - Typed helpers for the four RPC methods

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod stream_io;

pub use connection::Connection;
pub use endpoint::ClientEndpoint;
pub use error::ClientError;
