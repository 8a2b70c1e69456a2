//! Async message read/write helpers for quinn streams.
//!
//! One call rides one bidirectional stream: write the request, finish the
//! send half, read the response until FIN. Encoding and size caps live in
//! `netcall_proto::wire`.

use quinn::{RecvStream, SendStream};
use serde::de::DeserializeOwned;
use serde::Serialize;

use netcall_proto::wire;

use crate::error::{ClientError, Result};

/// Write a wire message to a send stream and signal completion.
pub async fn write_message<M: Serialize>(send: &mut SendStream, msg: &M) -> Result<()> {
    let buf = wire::encode_message(msg)?;
    send.write_all(&buf)
        .await
        .map_err(|e| ClientError::StreamIo(format!("write: {e}")))?;
    send.finish()
        .map_err(|e| ClientError::StreamIo(format!("finish: {e}")))?;
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
        .map_err(|e| ClientError::StreamIo(format!("read: {e}")))?;
    Ok(wire::decode_message(&buf)?)
}
