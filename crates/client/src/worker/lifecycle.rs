//! Install, activate and message handling for a worker version.

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use sharecache_core::Error;
use std::sync::atomic::Ordering;

use super::message::ControlMessage;
use super::{ServiceWorker, WorkerState};
use crate::fetch::{AssetRequest, RequestMode};

/// A precache URL that did not make it into the generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a completed install.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
    /// RFC 3339 completion time.
    pub installed_at: String,
}

/// Outcome of a completed activation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub version: String,
    /// Generations removed, oldest first.
    pub deleted: Vec<String>,
    /// Open pages that switched to this version.
    pub claimed: usize,
    /// RFC 3339 completion time.
    pub activated_at: String,
}

impl ServiceWorker {
    /// Open this version's generation and precache the vendor manifest.
    ///
    /// Individual precache failures are logged and reported but never fail the
    /// install. Failing to open the generation does: the worker becomes
    /// redundant and the error is returned.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing).await;
        let version = self.config.version.as_str();
        tracing::info!(version, precache = self.config.precache.len(), "installing worker");

        if let Err(e) = self.store.open(version).await {
            tracing::error!(version, error = %e, "install failed: could not open cache generation");
            self.set_state(WorkerState::Redundant).await;
            return Err(Error::InstallFailed(format!("{version}: {e}")));
        }

        let mut report = self.precache().await;
        report.installed_at = Utc::now().to_rfc3339();
        if report.failed.is_empty() {
            tracing::info!(version, cached = report.cached.len(), "precache complete");
        } else {
            tracing::warn!(
                version,
                cached = report.cached.len(),
                failed = report.failed.len(),
                "precache incomplete; continuing install"
            );
        }

        if self.config.skip_waiting_on_install {
            self.skip_waiting();
        }

        self.set_state(WorkerState::Installed).await;
        Ok(report)
    }

    async fn precache(&self) -> InstallReport {
        let fetches = self.config.precache.iter().map(|url| async move {
            let request = AssetRequest::get(url.clone()).with_mode(RequestMode::Cors);
            (url.to_string(), self.precache_one(&request).await)
        });

        let mut report = InstallReport { version: self.config.version.clone(), ..Default::default() };
        for (url, result) in join_all(fetches).await {
            match result {
                Ok(()) => report.cached.push(url),
                Err(e) => {
                    tracing::warn!(version = %self.config.version, url = %url, error = %e, "precache failed");
                    report.failed.push(PrecacheFailure { url, reason: e.to_string() });
                }
            }
        }
        report
    }

    async fn precache_one(&self, request: &AssetRequest) -> Result<(), Error> {
        let response = self.fetcher.fetch(request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("status {}", response.status)));
        }
        self.store.put(&self.config.version, &request.key(), &response).await
    }

    /// Delete every other generation and take control of all open pages.
    ///
    /// Safe to repeat: a second activation of the same version deletes nothing
    /// and keeps the current generation's entries.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.set_state(WorkerState::Activating).await;
        let version = self.config.version.as_str();

        let report = match self.purge_stale_generations().await {
            Ok(deleted) => {
                let claimed = self.clients.claim(version).await;
                ActivateReport { version: version.to_string(), deleted, claimed, activated_at: Utc::now().to_rfc3339() }
            }
            Err(e) => {
                tracing::error!(version, error = %e, "activation failed");
                self.set_state(WorkerState::Installed).await;
                return Err(e);
            }
        };

        tracing::info!(version, deleted = ?report.deleted, claimed = report.claimed, "worker activated");
        self.set_state(WorkerState::Activated).await;
        Ok(report)
    }

    async fn purge_stale_generations(&self) -> Result<Vec<String>, Error> {
        let version = self.config.version.as_str();
        let mut deleted = Vec::new();

        for name in self.store.keys().await? {
            if name != version && self.store.delete(&name).await? {
                tracing::debug!(version, generation = %name, "deleted stale cache generation");
                deleted.push(name);
            }
        }

        self.store.open(version).await?;
        Ok(deleted)
    }

    /// Handle a posted message. Only [`ControlMessage::SkipWaiting`] has an effect.
    pub async fn handle_message(&self, value: &Value) -> Option<ControlMessage> {
        match ControlMessage::parse(value) {
            Some(ControlMessage::SkipWaiting) => {
                tracing::info!(version = %self.config.version, "skip-waiting requested");
                self.skip_waiting();
                Some(ControlMessage::SkipWaiting)
            }
            None => {
                tracing::debug!(version = %self.config.version, "ignoring unrecognized message");
                None
            }
        }
    }

    /// Ask to be activated as soon as install finishes, without waiting for pages to close.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::MockFetcher;
    use crate::worker::{Clients, WorkerConfig};
    use serde_json::json;
    use sharecache_core::{CacheDb, MemoryStore, RequestKey, ResponseSnapshot, SnapshotStore};
    use std::sync::Arc;
    use url::Url;

    const FONT_CSS: &str = "https://fonts.googleapis.com/css2?family=Inter";
    const ICONS: &str = "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css";
    const SDK: &str = "https://www.gstatic.com/firebasejs/10.7.1/firebase-app-compat.js";

    fn config(version: &str) -> WorkerConfig {
        WorkerConfig::new(version, Url::parse("https://shares.example.com/service-worker.js").unwrap())
            .with_precache([FONT_CSS, ICONS, SDK].iter().map(|u| Url::parse(u).unwrap()).collect())
    }

    fn worker(version: &str, store: &MemoryStore, fetcher: &Arc<MockFetcher>, clients: &Clients) -> ServiceWorker {
        ServiceWorker::new(config(version), Arc::new(store.clone()), fetcher.clone(), clients.clone()).unwrap()
    }

    fn sqlite_worker(version: &str, store: &CacheDb, fetcher: &Arc<MockFetcher>, clients: &Clients) -> ServiceWorker {
        ServiceWorker::new(config(version), Arc::new(store.clone()), fetcher.clone(), clients.clone()).unwrap()
    }

    fn full_manifest() -> Arc<MockFetcher> {
        let fetcher = MockFetcher::new();
        fetcher.route(FONT_CSS, 200, "@font-face{}");
        fetcher.route(ICONS, 200, ".fa{}");
        fetcher.route(SDK, 200, "firebase");
        Arc::new(fetcher)
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let worker = worker("v1", &store, &fetcher, &Clients::new());

        let report = worker.install().await.unwrap();
        assert_eq!(report.version, "v1");
        assert_eq!(report.cached.len(), 3);
        assert!(report.failed.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.installed_at).is_ok());
        assert_eq!(store.entry_count("v1").await, Some(3));
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.skips_waiting());
    }

    #[tokio::test]
    async fn test_install_survives_missing_asset() {
        let store = MemoryStore::new();
        let fetcher = MockFetcher::new();
        fetcher.route(FONT_CSS, 200, "@font-face{}");
        fetcher.route(SDK, 200, "firebase");
        let fetcher = Arc::new(fetcher);
        let worker = worker("v1", &store, &fetcher, &Clients::new());

        let report = worker.install().await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, ICONS);
        assert!(report.failed[0].reason.contains("404"));
        assert!(store.match_entry("v1", &RequestKey::get(FONT_CSS)).await.unwrap().is_some());
        assert!(store.match_entry("v1", &RequestKey::get(SDK)).await.unwrap().is_some());
        assert!(store.match_entry("v1", &RequestKey::get(ICONS)).await.unwrap().is_none());
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_survives_offline() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        fetcher.set_offline(true);
        let worker = worker("v1", &store, &fetcher, &Clients::new());

        let report = worker.install().await.unwrap();
        assert_eq!(report.failed.len(), 3);
        assert_eq!(store.keys().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_install_survives_write_failure() {
        let store = MemoryStore::new();
        store.set_read_only(true);
        let fetcher = full_manifest();
        let worker = worker("v1", &store, &fetcher, &Clients::new());

        let report = worker.install().await.unwrap();
        assert_eq!(report.failed.len(), 3);
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_fails_when_storage_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let fetcher = full_manifest();
        let worker = worker("v1", &store, &fetcher, &Clients::new());

        let result = worker.install().await;
        assert!(matches!(result, Err(Error::InstallFailed(_))));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_install_without_skip_waiting() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let worker = ServiceWorker::new(
            config("v1").with_skip_waiting_on_install(false),
            Arc::new(store.clone()),
            fetcher.clone(),
            Clients::new(),
        )
        .unwrap();

        worker.install().await.unwrap();
        assert!(!worker.skips_waiting());
    }

    #[tokio::test]
    async fn test_version_rotation() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let clients = Clients::new();

        let old = worker("v7", &store, &fetcher, &clients);
        old.install().await.unwrap();
        old.activate().await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v7"]);

        let new = worker("v8", &store, &fetcher, &clients);
        new.install().await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v7", "v8"]);

        let report = new.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v7"]);
        assert_eq!(store.keys().await.unwrap(), vec!["v8"]);
        assert_eq!(new.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_repeated_activation_is_idempotent() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let worker = worker("v1", &store, &fetcher, &Clients::new());
        worker.install().await.unwrap();
        store.open("stale-v0").await.unwrap();

        let extra = RequestKey::get("https://shares.example.com/script.js");
        store
            .put("v1", &extra, &ResponseSnapshot::new(&extra.url, 200, "app()"))
            .await
            .unwrap();

        for _ in 0..3 {
            let before = store.entry_keys("v1").await.unwrap();
            worker.activate().await.unwrap();

            assert_eq!(store.keys().await.unwrap(), vec!["v1"]);
            let after = store.entry_keys("v1").await.unwrap();
            assert!(before.iter().all(|k| after.contains(k)));
        }
        assert_eq!(store.entry_count("v1").await, Some(4));
    }

    #[tokio::test]
    async fn test_activate_claims_open_pages() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let clients = Clients::new();
        let page = clients.open(None).await;
        let worker = worker("v1", &store, &fetcher, &clients);
        worker.install().await.unwrap();

        let report = worker.activate().await.unwrap();
        assert_eq!(report.claimed, 1);
        assert_eq!(clients.controller(page).await.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_activate_failure_returns_to_installed() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let worker = worker("v1", &store, &fetcher, &Clients::new());
        worker.install().await.unwrap();

        store.set_unavailable(true);
        assert!(worker.activate().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_handle_message() {
        let store = MemoryStore::new();
        let fetcher = full_manifest();
        let worker = ServiceWorker::new(
            config("v1").with_skip_waiting_on_install(false),
            Arc::new(store),
            fetcher,
            Clients::new(),
        )
        .unwrap();

        assert_eq!(worker.handle_message(&json!({"type": "REFRESH"})).await, None);
        assert!(!worker.skips_waiting());

        let handled = worker.handle_message(&json!({"type": "SKIP_WAITING"})).await;
        assert_eq!(handled, Some(ControlMessage::SkipWaiting));
        assert!(worker.skips_waiting());
    }

    #[tokio::test]
    async fn test_version_rotation_on_sqlite() {
        let store = CacheDb::open_in_memory().await.unwrap();
        let fetcher = full_manifest();
        let clients = Clients::new();

        let old = sqlite_worker("v7", &store, &fetcher, &clients);
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new = sqlite_worker("v8", &store, &fetcher, &clients);
        new.install().await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v7", "v8"]);

        let report = new.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["v7"]);
        assert_eq!(store.keys().await.unwrap(), vec!["v8"]);
        assert!(store.entry_keys("v7").await.unwrap().is_empty());
        assert_eq!(store.entry_keys("v8").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_activation_is_idempotent_on_sqlite() {
        let store = CacheDb::open_in_memory().await.unwrap();
        let fetcher = full_manifest();
        let worker = sqlite_worker("v1", &store, &fetcher, &Clients::new());
        worker.install().await.unwrap();
        store.open("stale-v0").await.unwrap();

        let extra = RequestKey::get("https://shares.example.com/script.js");
        store
            .put("v1", &extra, &ResponseSnapshot::new(&extra.url, 200, "app()"))
            .await
            .unwrap();

        for _ in 0..3 {
            let before = store.entry_keys("v1").await.unwrap();
            worker.activate().await.unwrap();

            assert_eq!(store.keys().await.unwrap(), vec!["v1"]);
            let after = store.entry_keys("v1").await.unwrap();
            assert!(before.iter().all(|k| after.contains(k)));
        }
        assert_eq!(store.entry_keys("v1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_install_survives_missing_asset_on_sqlite() {
        let store = CacheDb::open_in_memory().await.unwrap();
        let fetcher = MockFetcher::new();
        fetcher.route(FONT_CSS, 200, "@font-face{}");
        fetcher.route(SDK, 200, "firebase");
        let fetcher = Arc::new(fetcher);
        let worker = sqlite_worker("v1", &store, &fetcher, &Clients::new());

        let report = worker.install().await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, ICONS);
        assert!(store.match_entry("v1", &RequestKey::get(FONT_CSS)).await.unwrap().is_some());
        assert!(store.match_entry("v1", &RequestKey::get(SDK)).await.unwrap().is_some());
        assert!(store.match_entry("v1", &RequestKey::get(ICONS)).await.unwrap().is_none());
    }
}
