//! Inventory batch gateway: decode a declared inventory, dispatch a task.
//!
//! The gateway validates the inventory decode and hands off to a
//! [`TaskExecutor`]. Actual per-host automation is an extension seam: the
//! shipped [`StubExecutor`] acknowledges the task without doing work, and a
//! surrounding system supplies a real executor when one exists.

use thiserror::Error;
use tracing::info;

use netcall_proto::inventory::Inventory;

/// Fixed acknowledgement returned by the stub executor.
pub const BATCH_TASK_ACK: &str = "Batch task executed successfully!";

/// Failure reported by a task executor.
///
/// Unreachable today (the stub always succeeds), but the seam lets a real
/// executor fail without changing the call's response shape.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {task_name} failed: {reason}")]
    Failed { task_name: String, reason: String },
}

/// Runs a named task once per host of a decoded inventory.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, inventory: &Inventory, task_name: &str) -> Result<String, TaskError>;
}

/// Placeholder executor: logs what it was asked to do and acknowledges.
///
/// Deliberately performs no per-host work.
#[derive(Debug, Default)]
pub struct StubExecutor;

impl TaskExecutor for StubExecutor {
    fn execute(&self, inventory: &Inventory, task_name: &str) -> Result<String, TaskError> {
        info!(
            task = %task_name,
            hosts = inventory.hosts.len(),
            groups = inventory.groups.len(),
            "received batch task (execution not implemented)"
        );
        Ok(BATCH_TASK_ACK.to_string())
    }
}
