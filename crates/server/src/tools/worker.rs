//! worker_message and worker_status tool implementations.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sharecache_client::{Registration, ServiceWorker};
use sharecache_core::Error;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// The posted value, e.g. `{"type": "SKIP_WAITING"}`.
    pub message: Value,
}

/// Output from the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Whether the message was recognized and acted on.
    pub handled: bool,
    pub active_version: Option<String>,
    pub waiting_version: Option<String>,
}

/// One worker version as reported by worker_status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerInfo {
    pub version: String,
    pub state: String,
    pub scope: String,
    pub skips_waiting: bool,
}

impl WorkerInfo {
    async fn of(worker: &ServiceWorker) -> Self {
        Self {
            version: worker.version().to_string(),
            state: worker.state().await.to_string(),
            scope: worker.scope().base().to_string(),
            skips_waiting: worker.skips_waiting(),
        }
    }
}

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub active: Option<WorkerInfo>,
    pub waiting: Option<WorkerInfo>,
    /// Cache generations present in the store, oldest first.
    pub generations: Vec<String>,
    pub clients: usize,
    pub uncontrolled_clients: usize,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(registration: &Registration, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let handled = registration.post_message(&params.message).await?.is_some();

    let output = WorkerMessageOutput {
        handled,
        active_version: registration.active().await.map(|w| w.version().to_string()),
        waiting_version: registration.waiting().await.map(|w| w.version().to_string()),
    };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the worker_status tool.
pub async fn status_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let active = match registration.active().await {
        Some(worker) => Some(WorkerInfo::of(&worker).await),
        None => None,
    };
    let waiting = match registration.waiting().await {
        Some(worker) => Some(WorkerInfo::of(&worker).await),
        None => None,
    };

    let output = WorkerStatusOutput {
        active,
        waiting,
        generations: registration.store().keys().await?,
        clients: registration.clients().count().await,
        uncontrolled_clients: registration.clients().uncontrolled().await,
    };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
