//! Error types for the netcall protocol crate.
//!
//! RPC-level call failures travel on the wire as [`crate::wire::CallError`];
//! this module defines the Rust-native error types used within crate
//! boundaries, plus the call-error code constants.

use thiserror::Error;

/// Errors that can occur within the `netcall-proto` crate.
#[derive(Debug, Error)]
pub enum ProtoError {
    // --- Opaque payload codec ---
    #[error("payload is not valid base64: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("payload serialization failed: {0}")]
    PayloadEncode(postcard::Error),

    #[error("payload deserialization failed: {0}")]
    PayloadDecode(postcard::Error),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("payload nesting too deep (max {0})")]
    PayloadTooDeep(usize),

    // --- Inventory ---
    #[error("inventory host {index} has an empty address")]
    InventoryHostEmptyAddress { index: usize },

    // --- Wire messages ---
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("message encode failed: {0}")]
    MessageEncode(postcard::Error),

    #[error("message decode failed: {0}")]
    MessageDecode(postcard::Error),

    // --- TLS ---
    #[error("failed to read PEM material: {0}")]
    PemRead(String),

    #[error("TLS configuration error: {0}")]
    TlsConfiguration(String),
}

/// Result type alias using [`ProtoError`].
pub type Result<T> = std::result::Result<T, ProtoError>;

// =========================================================================
// Call-error code constants
//
// These strings populate `wire::CallError::code` when a handler turns a
// hard failure into an RPC-level error status.
// =========================================================================

/// The opaque payload in an `ExchangeObject` call could not be decoded.
pub const CODE_PAYLOAD_DECODE: &str = "PAYLOAD_DECODE";

/// The encoded inventory in an `ExecuteBatchTask` call could not be decoded.
pub const CODE_INVENTORY_DECODE: &str = "INVENTORY_DECODE";

/// A batch task executor reported failure.
pub const CODE_TASK_FAILED: &str = "TASK_FAILED";

/// The server failed internally while processing an otherwise valid call.
pub const CODE_INTERNAL: &str = "INTERNAL";
