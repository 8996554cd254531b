//! Fetch routing: network-first for the shell, cache-first for vendor assets.
//!
//! Each strategy is a straight sequence of at most two steps. Nothing is
//! retried and no placeholder response is ever synthesized; a request that
//! falls off the end of its chain comes back as [`FetchOutcome::Failed`].

use reqwest::Method;
use sharecache_core::{Error, ResponseSnapshot};
use std::sync::Arc;

use super::ServiceWorker;
use super::classify::{AssetClass, classify};
use crate::fetch::AssetRequest;

/// How a request was satisfied.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Fresh response from the network, whatever its status.
    Network(ResponseSnapshot),
    /// Stored snapshot from the worker's generation.
    Cache(ResponseSnapshot),
    /// Neither source produced a response.
    Failed(Error),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            FetchOutcome::Network(r) | FetchOutcome::Cache(r) => Some(r),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<ResponseSnapshot, Error> {
        match self {
            FetchOutcome::Network(r) | FetchOutcome::Cache(r) => Ok(r),
            FetchOutcome::Failed(e) => Err(e),
        }
    }

    /// `network`, `cache` or `failed`.
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Network(_) => "network",
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Failed(_) => "failed",
        }
    }
}

/// Only successful GETs are ever written to the cache.
pub fn is_cacheable(request: &AssetRequest, response: &ResponseSnapshot) -> bool {
    request.method == Method::GET && response.is_ok()
}

impl ServiceWorker {
    /// Route one intercepted request.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> FetchOutcome {
        let class = classify(request, &self.scope);
        let outcome = match class {
            AssetClass::Shell => self.network_first(request).await,
            AssetClass::Vendor => self.cache_first(request).await,
        };

        tracing::debug!(
            version = %self.config.version,
            method = %request.method,
            url = %request.url,
            %class,
            outcome = outcome.source(),
            "fetch handled"
        );
        outcome
    }

    /// Network, then cache on transport failure.
    pub async fn network_first(&self, request: &AssetRequest) -> FetchOutcome {
        let network_err = match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.cache_write(request, &response).await;
                return FetchOutcome::Network(response);
            }
            Err(e) => e,
        };

        match self.store.match_entry(&self.config.version, &request.key()).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %request.url, error = %network_err, "network failed; serving shell from cache");
                FetchOutcome::Cache(cached)
            }
            Ok(None) => FetchOutcome::Failed(network_err),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed after network failure");
                FetchOutcome::Failed(network_err)
            }
        }
    }

    /// Cache, then network on miss. A hit never touches the network.
    pub async fn cache_first(&self, request: &AssetRequest) -> FetchOutcome {
        match self.store.match_entry(&self.config.version, &request.key()).await {
            Ok(Some(cached)) => return FetchOutcome::Cache(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.cache_write(request, &response).await;
                FetchOutcome::Network(response)
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// Schedule a background write of a copy of `response`.
    ///
    /// Returns as soon as the write is queued. Failures are logged and dropped.
    async fn cache_write(&self, request: &AssetRequest, response: &ResponseSnapshot) {
        if !is_cacheable(request, response) {
            tracing::trace!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                "response not cacheable"
            );
            return;
        }

        let store = Arc::clone(&self.store);
        let generation = self.config.version.clone();
        let key = request.key();
        let snapshot = response.clone();

        let mut pending = self.pending_writes.lock().await;
        if self.writes_closed() {
            tracing::debug!(version = %self.config.version, url = %request.url, "worker retiring; cache write dropped");
            return;
        }
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(e) = store.put(&generation, &key, &snapshot).await {
                tracing::warn!(generation = %generation, key = %key, error = %e, "cache write failed");
            }
        });
    }
}
