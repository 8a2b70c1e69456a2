//! Wire message types for the netcall RPC protocol.
//!
//! One call rides one bidirectional stream: the client writes a single
//! [`Request`], finishes its send half, and reads a single [`Response`]
//! until FIN. Messages are postcard-encoded with a hard size cap on both
//! sides to prevent unbounded allocation from a hostile peer.

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};

/// Maximum encoded message size (1 MiB), enforced on encode and decode.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// The fixed command submitted by every `FetchDeviceConfig` call.
pub const SHOW_RUNNING_CONFIG: &str = "show running-config";

/// RPC request protocol.
///
/// Each variant is one method; dispatch is a pure variant-to-handler
/// mapping with no shared state between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Echo the given text back with an `"Echo: "` prefix.
    Echo(EchoRequest),

    /// Deliver an opaque encoded payload; the server decodes and
    /// acknowledges receipt.
    ExchangeObject(OpaqueExchangeRequest),

    /// Fetch the running configuration of a single network device.
    FetchDeviceConfig(DeviceTarget),

    /// Dispatch a named task against an encoded device inventory.
    ExecuteBatchTask(InventoryBatchRequest),
}

/// RPC response protocol.
///
/// `Error` is the hard-failure channel: a call that cannot produce its
/// normal response shape (payload decode failure, internal fault) terminates
/// with an error status instead. Device-level failures in
/// `FetchDeviceConfig` deliberately do NOT use it; they come back as a
/// normal response whose result text begins with `"Error: "`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Echo(EchoResponse),
    ExchangeObject(OpaqueExchangeResponse),
    FetchDeviceConfig(DeviceFetchResponse),
    ExecuteBatchTask(BatchResponse),
    Error(CallError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoResponse {
    /// `"Echo: "` followed by the request text, verbatim.
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpaqueExchangeRequest {
    /// Text encoding of a caller-defined value, produced by
    /// [`crate::payload::encode`].
    pub encoded_payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueExchangeResponse {
    /// Fixed acknowledgement: `"Object received"`.
    pub result: String,
}

/// Connection parameters for one network device.
///
/// Fully transient: constructed per call, never persisted. The `Debug`
/// impl redacts the password so the value can never leak credentials into
/// a logging sink.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeviceTarget {
    /// Device platform identifier (e.g. `cisco_ios`). Carried through to
    /// logs and the connector; not interpreted by the protocol.
    pub platform: String,
    /// Device address: `host` or `host:port`; IPv6 literals carry a port in
    /// bracketed form, `[addr]:port`.
    pub address: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for DeviceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTarget")
            .field("platform", &self.platform)
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFetchResponse {
    /// Either `"Running config:\n"` + captured output, or `"Error: "` +
    /// failure description. Both arrive as a successful call; callers must
    /// inspect the text to distinguish outcomes.
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBatchRequest {
    /// Text encoding of an [`crate::inventory::Inventory`], produced by
    /// [`crate::inventory::encode`].
    pub encoded_inventory: String,
    /// Name of the task to run once per inventory host.
    pub task_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub result: String,
}

/// RPC-level error status terminating a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallError {
    /// Machine-readable code (see the constants in [`crate::error`]).
    pub code: String,
    pub message: String,
}

impl CallError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Encode a wire message, enforcing [`MAX_MESSAGE_SIZE`].
pub fn encode_message<M: Serialize>(msg: &M) -> Result<Vec<u8>> {
    let bytes = postcard::to_stdvec(msg).map_err(ProtoError::MessageEncode)?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtoError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(bytes)
}

/// Decode a wire message, enforcing [`MAX_MESSAGE_SIZE`].
pub fn decode_message<'a, M: Deserialize<'a>>(bytes: &'a [u8]) -> Result<M> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtoError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    postcard::from_bytes(bytes).map_err(ProtoError::MessageDecode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let req = Request::Echo(EchoRequest {
            text: "Hello World!".into(),
        });
        let bytes = encode_message(&req).expect("encode");
        let decoded: Request = decode_message(&bytes).expect("decode");
        match decoded {
            Request::Echo(echo) => assert_eq!(echo.text, "Hello World!"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn error_response_roundtrip() {
        let resp = Response::Error(CallError::new("PAYLOAD_DECODE", "bad base64"));
        let bytes = encode_message(&resp).expect("encode");
        let decoded: Response = decode_message(&bytes).expect("decode");
        match decoded {
            Response::Error(err) => {
                assert_eq!(err.code, "PAYLOAD_DECODE");
                assert_eq!(err.message, "bad base64");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn device_target_debug_redacts_password() {
        let target = DeviceTarget {
            platform: "cisco_ios".into(),
            address: "192.0.2.1".into(),
            username: "admin".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{target:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("192.0.2.1"));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result: Result<Request> = decode_message(&[0xff, 0xff, 0xff, 0xff]);
        assert!(result.is_err());
    }
}
