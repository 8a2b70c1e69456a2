//! Error types for the client transport layer.

use thiserror::Error;

use netcall_proto::wire::CallError;

/// Errors that can occur in the client transport.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("endpoint creation failed: {0}")]
    Endpoint(String),

    #[error("connection failed: {0}")]
    Connection(#[from] quinn::ConnectionError),

    #[error("connect error: {0}")]
    Connect(#[from] quinn::ConnectError),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("stream I/O error: {0}")]
    StreamIo(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] netcall_proto::ProtoError),

    /// The server terminated the call with an RPC-level error status.
    #[error("call failed with status {0}")]
    Call(CallError),

    /// The server answered with a response shape that does not match the
    /// method that was called.
    #[error("unexpected response variant for {method}")]
    UnexpectedResponse { method: &'static str },
}

pub type Result<T> = std::result::Result<T, ClientError>;
