//! netcall wire protocol definitions.
//!
//! Shared protocol layer used by both `netcall-server` and
//! `netcall-client`:
//!
//! - RPC request/response message types (four methods, one error status)
//! - Opaque payload codec (closed variant set, postcard + base64)
//! - Typed device inventory model for batch dispatch
//! - TLS configuration builders (server-authenticated, CA-validated)

pub mod error;
pub mod inventory;
pub mod payload;
pub mod tls;
pub mod wire;

pub use error::ProtoError;
pub use payload::PayloadValue;
