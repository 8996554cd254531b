//! cache_list tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sharecache_client::Registration;
use sharecache_core::{Error, RequestKey};

use super::resolve_generation;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Generation to list (default: the active worker's version).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub generation: String,
    pub entries: Vec<RequestKey>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(registration: &Registration, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let generation = resolve_generation(registration, params.generation).await?;
    let entries = registration.store().entry_keys(&generation).await?;

    let output = CacheListOutput { generation, entries };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Encoding(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
