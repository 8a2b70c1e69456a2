//! Async message read/write helpers for quinn streams.
//!
//! Each call uses one bidirectional stream: the server reads one request
//! until FIN, writes one response, and finishes its send half. Encoding and
//! size caps live in `netcall_proto::wire`.

use quinn::{RecvStream, SendStream};
use serde::de::DeserializeOwned;
use serde::Serialize;

use netcall_proto::wire;

use crate::error::{Result, ServerError};

/// Write a wire message to a send stream and signal completion.
pub async fn write_message<M: Serialize>(send: &mut SendStream, msg: &M) -> Result<()> {
    let buf = wire::encode_message(msg)?;
    send.write_all(&buf)
        .await
        .map_err(|e| ServerError::StreamIo(format!("write: {e}")))?;
    send.finish()
        .map_err(|e| ServerError::StreamIo(format!("finish: {e}")))?;
    Ok(())
}

/// Read a wire message from a receive stream.
///
/// Reads until FIN (stream closed by peer), bounded by the protocol's
/// message size cap, then decodes.
pub async fn read_message<M: DeserializeOwned>(recv: &mut RecvStream) -> Result<M> {
    let buf = recv
        .read_to_end(wire::MAX_MESSAGE_SIZE)
        .await
        .map_err(|e| ServerError::StreamIo(format!("read: {e}")))?;
    Ok(wire::decode_message(&buf)?)
}
