//! asset_fetch tool implementation.
//!
//! Routes a request through the active worker, as a controlled page would.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sharecache_client::{AssetRequest, Registration, RequestMode, classify};
use sharecache_core::Error;

use super::{default_method, parse_method};
use crate::error::ServerError;

/// Input parameters for asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchParams {
    /// The absolute URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET responses are ever cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Issue the request as a top-level page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output structure for asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchOutput {
    /// The canonical URL requested.
    pub url: String,
    /// `shell` or `vendor`; absent when no worker controls the scope.
    pub class: Option<String>,
    /// `network` or `cache`.
    pub served_from: String,
    /// Cache generation consulted, if any.
    pub generation: Option<String>,
    pub status: u16,
    pub content_type: Option<String>,
    /// Response body, lossily decoded as UTF-8.
    pub body: String,
}

/// Implementation of the asset_fetch tool.
pub async fn fetch_impl(registration: &Registration, params: AssetFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ServerError::InvalidInput("url cannot be empty".into()).into());
    }

    let method = parse_method(&params.method)?;
    let mut request = AssetRequest::parse(params.url.trim())?.with_method(method);
    if params.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }

    let active = registration.active().await;
    let class = active.as_ref().map(|w| classify(&request, w.scope()).to_string());
    let generation = active.as_ref().map(|w| w.version().to_string());

    let outcome = registration.fetch(&request).await;
    let served_from = outcome.source().to_string();
    let response = outcome.into_result()?;

    tracing::debug!(url = %request.url, class = ?class, served_from = %served_from, status = response.status, "asset_fetch");

    let output = AssetFetchOutput {
        url: request.url.to_string(),
        class,
        served_from,
        generation,
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
