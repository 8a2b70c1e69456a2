//! Established connection and typed call helpers.
//!
//! `Connection` wraps a live QUIC connection to a server. Every call opens
//! a fresh bidirectional stream, writes one request, and reads one
//! response; calls are independent and may run concurrently over the same
//! connection.

use tracing::debug;

use netcall_proto::payload::{self, PayloadValue};
use netcall_proto::inventory::{self, Inventory};
use netcall_proto::wire::{
    DeviceTarget, EchoRequest, InventoryBatchRequest, OpaqueExchangeRequest, Request, Response,
};

use crate::error::{ClientError, Result};
use crate::stream_io;

/// A live connection to a netcall server.
pub struct Connection {
    inner: quinn::Connection,
}

impl Connection {
    pub(crate) fn new(inner: quinn::Connection) -> Self {
        Self { inner }
    }

    /// Issue one raw call: open a stream, send the request, read the
    /// response. An RPC-level error status becomes [`ClientError::Call`].
    pub async fn call(&self, request: Request) -> Result<Response> {
        let (mut send, mut recv) = self
            .inner
            .open_bi()
            .await
            .map_err(|e| ClientError::StreamIo(format!("open stream: {e}")))?;

        stream_io::write_message(&mut send, &request).await?;
        let response: Response = stream_io::read_message(&mut recv).await?;

        debug!(response = ?response, "call completed");

        match response {
            Response::Error(err) => Err(ClientError::Call(err)),
            other => Ok(other),
        }
    }

    /// `Echo`: the server returns `"Echo: "` + the given text.
    pub async fn echo(&self, text: impl Into<String>) -> Result<String> {
        let response = self
            .call(Request::Echo(EchoRequest { text: text.into() }))
            .await?;
        match response {
            Response::Echo(echo) => Ok(echo.result),
            _ => Err(ClientError::UnexpectedResponse { method: "Echo" }),
        }
    }

    /// `ExchangeObject`: encode a caller-defined value and deliver it.
    pub async fn exchange_object(&self, value: &PayloadValue) -> Result<String> {
        let encoded_payload = payload::encode(value)?;
        let response = self
            .call(Request::ExchangeObject(OpaqueExchangeRequest {
                encoded_payload,
            }))
            .await?;
        match response {
            Response::ExchangeObject(ack) => Ok(ack.result),
            _ => Err(ClientError::UnexpectedResponse {
                method: "ExchangeObject",
            }),
        }
    }

    /// `FetchDeviceConfig`: fetch one device's running configuration.
    ///
    /// Device-level failures arrive inside the result text (prefixed
    /// `"Error: "`), not as an `Err` — inspect the text to distinguish
    /// outcomes.
    pub async fn fetch_device_config(&self, target: DeviceTarget) -> Result<String> {
        let response = self.call(Request::FetchDeviceConfig(target)).await?;
        match response {
            Response::FetchDeviceConfig(fetch) => Ok(fetch.result),
            _ => Err(ClientError::UnexpectedResponse {
                method: "FetchDeviceConfig",
            }),
        }
    }

    /// `ExecuteBatchTask`: ship an inventory and a task name for dispatch.
    pub async fn execute_batch_task(
        &self,
        inventory: &Inventory,
        task_name: impl Into<String>,
    ) -> Result<String> {
        let encoded_inventory = inventory::encode(inventory)?;
        let response = self
            .call(Request::ExecuteBatchTask(InventoryBatchRequest {
                encoded_inventory,
                task_name: task_name.into(),
            }))
            .await?;
        match response {
            Response::ExecuteBatchTask(batch) => Ok(batch.result),
            _ => Err(ClientError::UnexpectedResponse {
                method: "ExecuteBatchTask",
            }),
        }
    }

    /// Close the connection. In-flight device sessions on the server are
    /// not interrupted; they run to completion and their responses are
    /// discarded.
    pub fn close(&self) {
        self.inner.close(0u32.into(), b"done");
    }
}
