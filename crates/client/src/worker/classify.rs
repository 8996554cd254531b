//! Per-request asset classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::scope::Scope;
use crate::fetch::AssetRequest;

/// Which strategy a request is served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// The app's own document, script and style, plus navigations. Network-first.
    Shell,
    /// Everything else, mostly precached third-party assets. Cache-first.
    Vendor,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Shell => f.write_str("shell"),
            AssetClass::Vendor => f.write_str("vendor"),
        }
    }
}

/// Classify a request against the worker's scope.
pub fn classify(request: &AssetRequest, scope: &Scope) -> AssetClass {
    if request.is_navigation() || scope.is_shell_url(&request.url) {
        AssetClass::Shell
    } else {
        AssetClass::Vendor
    }
}
