//! Outgoing requests as seen by the worker.

use reqwest::Method;
use sharecache_core::{Error, RequestKey};
use url::Url;

use super::url::canonicalize;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// A resource request intercepted from a controlled page.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
}

impl AssetRequest {
    /// A plain subresource GET.
    pub fn get(url: Url) -> Self {
        Self { url, method: Method::GET, mode: RequestMode::NoCors }
    }

    /// A page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { url, method: Method::GET, mode: RequestMode::Navigate }
    }

    /// Parse and canonicalize a URL string into a GET request.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::get(url))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }
}
