//! Fixtures shared by the tool tests.

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use sharecache_client::{AssetRequest, Fetcher, Registration, WorkerConfig};
use sharecache_core::{Error, MemoryStore, ResponseSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

pub const WORKER_URL: &str = "https://shares.example.com/service-worker.js";
pub const INDEX: &str = "https://shares.example.com/index.html";
pub const SDK: &str = "https://www.gstatic.com/firebasejs/10.7.1/firebase-app-compat.js";

/// Serves a fixed route table; unknown URLs get a 404.
#[derive(Default)]
pub struct StaticFetcher {
    routes: HashMap<String, String>,
    offline: AtomicBool,
}

impl StaticFetcher {
    pub fn new(routes: &[(&str, &str)]) -> Self {
        let routes = routes.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect();
        Self { routes, offline: AtomicBool::new(false) }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<ResponseSnapshot, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        Ok(match self.routes.get(request.url.as_str()) {
            Some(body) => ResponseSnapshot::new(request.url.as_str(), 200, body.as_bytes().to_vec())
                .with_header("content-type", "text/html; charset=utf-8"),
            None => ResponseSnapshot::new(request.url.as_str(), 404, b"not found".to_vec()),
        })
    }
}

/// A registration with `v1` active over a memory store, precaching [`SDK`].
pub async fn registration(fetcher: Arc<StaticFetcher>) -> (Arc<Registration>, MemoryStore) {
    let store = MemoryStore::new();
    let registration = Arc::new(Registration::new(Arc::new(store.clone()), fetcher));
    let config =
        WorkerConfig::new("v1", Url::parse(WORKER_URL).unwrap()).with_precache(vec![Url::parse(SDK).unwrap()]);
    registration.register(config).await.unwrap();
    (registration, store)
}

/// Decode the JSON text payload of a tool result.
pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
