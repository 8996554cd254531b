//! MCP tool implementations.
//!
//! This module contains all tools exposed by the sharecache server.

pub mod asset_fetch;
pub mod cache;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::ServerError;
use sharecache_client::Method;

fn default_method() -> String {
    "GET".into()
}

/// Parse a method name, case-insensitively.
pub(crate) fn parse_method(method: &str) -> Result<Method, ServerError> {
    method
        .trim()
        .to_ascii_uppercase()
        .parse::<Method>()
        .map_err(|_| ServerError::InvalidMethod(method.to_string()))
}
