//! Scripted fetcher for worker tests.

use sharecache_core::{Error, ResponseSnapshot};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::Fetcher;
use crate::fetch::AssetRequest;

/// Serves routed URLs, 404s everything else, and counts every call.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        let (status, body) = route.unwrap_or_else(|| (404, b"not found".to_vec()));
        Ok(ResponseSnapshot::new(request.url.as_str(), status, body).with_header("content-type", "text/plain"))
    }
}
