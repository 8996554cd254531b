//! cache_get tool implementation.
//!
//! Retrieves a stored response by request method and URL.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sharecache_client::{AssetRequest, Registration};
use sharecache_core::{Error, RequestKey};

use super::resolve_generation;
use crate::tools::{default_method, parse_method};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The request URL.
    pub url: String,

    /// The request method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Generation to read (default: the active worker's version).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key: RequestKey,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub content_type: Option<String>,
    /// Body length in bytes.
    pub size: usize,
    /// Body, lossily decoded as UTF-8.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(registration: &Registration, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let method = parse_method(&params.method)?;
    let key = AssetRequest::parse(params.url.trim())?.with_method(method).key();
    let generation = resolve_generation(registration, params.generation).await?;

    let response = registration
        .store()
        .match_entry(&generation, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{key} in {generation}")))?;

    let output = CacheGetOutput {
        content_type: response.content_type().map(str::to_string),
        size: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        status: response.status,
        headers: response.headers,
        generation,
        key,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Encoding(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
