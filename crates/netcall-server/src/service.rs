//! Method dispatcher: one inbound request, exactly one of four handlers.
//!
//! Dispatch is a pure variant-to-handler mapping with no state shared
//! between calls. The service itself only holds the two extension seams
//! (device connector, task executor), both immutable and `Send + Sync`.

use std::sync::Arc;

use tracing::{info, warn};

use netcall_proto::error::{
    CODE_INTERNAL, CODE_INVENTORY_DECODE, CODE_PAYLOAD_DECODE, CODE_TASK_FAILED,
};
use netcall_proto::wire::{
    BatchResponse, CallError, DeviceFetchResponse, DeviceTarget, EchoRequest, EchoResponse,
    InventoryBatchRequest, OpaqueExchangeRequest, OpaqueExchangeResponse, Request, Response,
};
use netcall_proto::{inventory, payload};

use crate::gateway::{StubExecutor, TaskExecutor};
use crate::session::{fetch_running_config, DeviceConnector, SshConnector};

/// Fixed acknowledgement for a successfully decoded opaque payload.
const OBJECT_RECEIVED: &str = "Object received";

/// The automation service behind the RPC surface.
pub struct AutomationService {
    connector: Arc<dyn DeviceConnector>,
    executor: Arc<dyn TaskExecutor>,
}

impl Default for AutomationService {
    fn default() -> Self {
        Self::new(Arc::new(SshConnector), Arc::new(StubExecutor))
    }
}

impl AutomationService {
    /// Build a service with explicit seams. Tests substitute mocks here;
    /// production uses [`AutomationService::default`].
    pub fn new(connector: Arc<dyn DeviceConnector>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            connector,
            executor,
        }
    }

    /// Route one request to its handler and produce the response.
    ///
    /// Payload and inventory decode failures terminate the call with an
    /// error status; device-level failures come back as normal responses
    /// whose result text begins with `"Error: "`.
    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::Echo(req) => Response::Echo(self.echo(req)),
            Request::ExchangeObject(req) => self.exchange_object(req),
            Request::FetchDeviceConfig(target) => self.fetch_device_config(target).await,
            Request::ExecuteBatchTask(req) => self.execute_batch_task(req).await,
        }
    }

    fn echo(&self, request: EchoRequest) -> EchoResponse {
        info!(text = %request.text, "received text");
        EchoResponse {
            result: format!("Echo: {}", request.text),
        }
    }

    fn exchange_object(&self, request: OpaqueExchangeRequest) -> Response {
        match payload::decode(&request.encoded_payload) {
            Ok(value) => {
                info!(kind = value.kind(), value = ?value, "received object");
                Response::ExchangeObject(OpaqueExchangeResponse {
                    result: OBJECT_RECEIVED.to_string(),
                })
            }
            Err(err) => {
                warn!(error = %err, "opaque payload decode failed");
                Response::Error(CallError::new(CODE_PAYLOAD_DECODE, err.to_string()))
            }
        }
    }

    async fn fetch_device_config(&self, target: DeviceTarget) -> Response {
        let connector = Arc::clone(&self.connector);
        // Device I/O is blocking; keep it off the async workers.
        let outcome =
            tokio::task::spawn_blocking(move || fetch_running_config(connector.as_ref(), &target))
                .await;

        match outcome {
            Ok(result) => Response::FetchDeviceConfig(DeviceFetchResponse { result }),
            Err(err) => {
                warn!(error = %err, "device fetch worker failed");
                Response::Error(CallError::new(CODE_INTERNAL, err.to_string()))
            }
        }
    }

    async fn execute_batch_task(&self, request: InventoryBatchRequest) -> Response {
        let inventory = match inventory::decode(&request.encoded_inventory) {
            Ok(inventory) => inventory,
            Err(err) => {
                warn!(error = %err, "inventory decode failed");
                return Response::Error(CallError::new(CODE_INVENTORY_DECODE, err.to_string()));
            }
        };

        info!(
            task = %request.task_name,
            hosts = inventory.hosts.len(),
            "dispatching batch task"
        );

        let executor = Arc::clone(&self.executor);
        let task_name = request.task_name;
        // Executors may drive blocking per-host sessions.
        let outcome =
            tokio::task::spawn_blocking(move || executor.execute(&inventory, &task_name)).await;

        match outcome {
            Ok(Ok(result)) => Response::ExecuteBatchTask(BatchResponse { result }),
            Ok(Err(err)) => Response::Error(CallError::new(CODE_TASK_FAILED, err.to_string())),
            Err(err) => {
                warn!(error = %err, "batch task worker failed");
                Response::Error(CallError::new(CODE_INTERNAL, err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcall_proto::inventory::{Group, Host, Inventory};
    use netcall_proto::payload::PayloadValue;
    use crate::gateway::{TaskError, BATCH_TASK_ACK};
    use crate::session::{DeviceSession, SessionError};

    /// Connector that refuses every connection.
    struct RefusingConnector;

    impl DeviceConnector for RefusingConnector {
        fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, SessionError> {
            Err(SessionError::Connect {
                address: target.address.clone(),
                reason: "connection refused".into(),
            })
        }
    }

    /// Executor that always fails, to exercise the error-status path.
    struct FailingExecutor;

    impl TaskExecutor for FailingExecutor {
        fn execute(&self, _: &Inventory, task_name: &str) -> Result<String, TaskError> {
            Err(TaskError::Failed {
                task_name: task_name.into(),
                reason: "boom".into(),
            })
        }
    }

    fn service() -> AutomationService {
        AutomationService::new(Arc::new(RefusingConnector), Arc::new(StubExecutor))
    }

    fn sample_inventory() -> Inventory {
        Inventory {
            hosts: vec![Host {
                name: "r1".into(),
                address: "192.0.2.1".into(),
                platform: "cisco_ios".into(),
                username: "admin".into(),
                password: "secret".into(),
                groups: vec![],
                data: PayloadValue::Null,
            }],
            groups: vec![Group {
                name: "core".into(),
                data: PayloadValue::Null,
            }],
            defaults: PayloadValue::Null,
        }
    }

    #[tokio::test]
    async fn echo_prefixes_text() {
        let response = service()
            .dispatch(Request::Echo(EchoRequest {
                text: "Hello World!".into(),
            }))
            .await;
        match response {
            Response::Echo(echo) => assert_eq!(echo.result, "Echo: Hello World!"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn echo_handles_empty_text() {
        let response = service()
            .dispatch(Request::Echo(EchoRequest { text: String::new() }))
            .await;
        match response {
            Response::Echo(echo) => assert_eq!(echo.result, "Echo: "),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn echo_handles_non_ascii_text() {
        let response = service()
            .dispatch(Request::Echo(EchoRequest {
                text: "héllo 世界".into(),
            }))
            .await;
        match response {
            Response::Echo(echo) => assert_eq!(echo.result, "Echo: héllo 世界"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn exchange_object_acknowledges_valid_payload() {
        let encoded = payload::encode(&PayloadValue::Map(vec![(
            "foo".into(),
            PayloadValue::Text("bar".into()),
        )]))
        .unwrap();
        let response = service()
            .dispatch(Request::ExchangeObject(OpaqueExchangeRequest {
                encoded_payload: encoded,
            }))
            .await;
        match response {
            Response::ExchangeObject(ack) => assert_eq!(ack.result, "Object received"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn exchange_object_rejects_malformed_payload() {
        let response = service()
            .dispatch(Request::ExchangeObject(OpaqueExchangeRequest {
                encoded_payload: "!!not base64!!".into(),
            }))
            .await;
        match response {
            Response::Error(err) => assert_eq!(err.code, CODE_PAYLOAD_DECODE),
            other => panic!("expected error status, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_device_config_reports_connect_failure_as_text() {
        let response = service()
            .dispatch(Request::FetchDeviceConfig(DeviceTarget {
                platform: "cisco_ios".into(),
                address: "192.0.2.1".into(),
                username: "admin".into(),
                password: "secret".into(),
            }))
            .await;
        match response {
            Response::FetchDeviceConfig(fetch) => {
                assert!(fetch.result.starts_with("Error: "), "got: {}", fetch.result);
            }
            other => panic!("device failure must be a normal response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_batch_task_acknowledges() {
        let encoded = inventory::encode(&sample_inventory()).unwrap();
        let response = service()
            .dispatch(Request::ExecuteBatchTask(InventoryBatchRequest {
                encoded_inventory: encoded,
                task_name: "backup_running_config".into(),
            }))
            .await;
        match response {
            Response::ExecuteBatchTask(batch) => assert_eq!(batch.result, BATCH_TASK_ACK),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_batch_task_rejects_malformed_inventory() {
        let response = service()
            .dispatch(Request::ExecuteBatchTask(InventoryBatchRequest {
                encoded_inventory: "@@@".into(),
                task_name: "backup_running_config".into(),
            }))
            .await;
        match response {
            Response::Error(err) => assert_eq!(err.code, CODE_INVENTORY_DECODE),
            other => panic!("expected error status, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_executor_surfaces_as_error_status() {
        let service =
            AutomationService::new(Arc::new(RefusingConnector), Arc::new(FailingExecutor));
        let encoded = inventory::encode(&sample_inventory()).unwrap();
        let response = service
            .dispatch(Request::ExecuteBatchTask(InventoryBatchRequest {
                encoded_inventory: encoded,
                task_name: "backup_running_config".into(),
            }))
            .await;
        match response {
            Response::Error(err) => {
                assert_eq!(err.code, CODE_TASK_FAILED);
                assert!(err.message.contains("boom"));
            }
            other => panic!("expected error status, got: {other:?}"),
        }
    }
}
