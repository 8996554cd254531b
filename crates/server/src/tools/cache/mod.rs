//! Cache-related MCP tools.
//!
//! This module provides read-only views of the worker's cache generations.

pub mod get;
pub mod list;

pub use get::{CacheGetParams, get_impl};
pub use list::{CacheListParams, list_impl};

use sharecache_client::Registration;
use sharecache_core::Error;

/// The requested generation, or the active worker's when none is named.
async fn resolve_generation(registration: &Registration, generation: Option<String>) -> Result<String, Error> {
    match generation.filter(|g| !g.trim().is_empty()) {
        Some(generation) => Ok(generation),
        None => registration
            .active()
            .await
            .map(|w| w.version().to_string())
            .ok_or_else(|| Error::NoController("no active worker; name a generation".into())),
    }
}
