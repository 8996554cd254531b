//! The offline asset cache worker.
//!
//! A [`ServiceWorker`] owns one cache generation and moves through the usual
//! lifecycle: install (open the generation, precache vendor assets), activate
//! (drop every other generation, claim open pages), then fetch (route each
//! request network-first or cache-first). A [`Registration`] holds the active
//! and waiting workers for a scope and decides when a new version takes over.

pub mod classify;
pub mod clients;
pub mod lifecycle;
pub mod message;
pub mod registration;
pub mod scope;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use sharecache_core::{AppConfig, Error, SnapshotStore};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

pub use classify::{AssetClass, classify};
pub use clients::{ClientId, Clients};
pub use lifecycle::{ActivateReport, InstallReport, PrecacheFailure};
pub use message::ControlMessage;
pub use registration::Registration;
pub use scope::Scope;
pub use strategy::{FetchOutcome, is_cacheable};

/// Immutable configuration a worker version is built with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Generation name; one per deployed version.
    pub version: String,
    /// Vendor assets fetched at install time, in order.
    pub precache: Vec<Url>,
    /// URL the worker script is served from.
    pub worker_url: Url,
    /// Shell asset paths relative to the worker's directory.
    pub shell_assets: Vec<String>,
    /// Activate right after install instead of waiting for a control message.
    pub skip_waiting_on_install: bool,
}

impl WorkerConfig {
    pub fn new(version: impl Into<String>, worker_url: Url) -> Self {
        Self {
            version: version.into(),
            precache: Vec::new(),
            worker_url,
            shell_assets: vec!["index.html".into(), "script.js".into(), "style.css".into()],
            skip_waiting_on_install: true,
        }
    }

    pub fn with_precache(mut self, precache: Vec<Url>) -> Self {
        self.precache = precache;
        self
    }

    pub fn with_shell_assets(mut self, shell_assets: Vec<String>) -> Self {
        self.shell_assets = shell_assets;
        self
    }

    pub fn with_skip_waiting_on_install(mut self, skip: bool) -> Self {
        self.skip_waiting_on_install = skip;
        self
    }

    /// Build the worker configuration from the loaded application config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let worker_url = Url::parse(&config.worker_url).map_err(|e| Error::InvalidUrl(format!("worker_url: {e}")))?;
        let precache = config
            .precache_urls
            .iter()
            .map(|u| Url::parse(u).map_err(|e| Error::InvalidUrl(format!("{u}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: config.cache_version.clone(),
            precache,
            worker_url,
            shell_assets: config.shell_assets.clone(),
            skip_waiting_on_install: config.skip_waiting_on_install,
        })
    }
}

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// One version of the offline asset cache worker.
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    scope: Scope,
    store: Arc<dyn SnapshotStore>,
    fetcher: Arc<dyn crate::Fetcher>,
    clients: Clients,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    writes_closed: AtomicBool,
    pending_writes: Mutex<JoinSet<()>>,
}

impl fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.config.version)
            .field("scope", &self.scope.base().as_str())
            .finish_non_exhaustive()
    }
}

impl ServiceWorker {
    /// Build a worker for `config`. The scope is derived from the worker URL.
    pub fn new(
        config: WorkerConfig, store: Arc<dyn SnapshotStore>, fetcher: Arc<dyn crate::Fetcher>, clients: Clients,
    ) -> Result<Self, Error> {
        let scope = Scope::from_worker_url(&config.worker_url, &config.shell_assets)?;

        Ok(Self {
            config: Arc::new(config),
            scope,
            store,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            writes_closed: AtomicBool::new(false),
            pending_writes: Mutex::new(JoinSet::new()),
        })
    }

    /// Generation name this worker reads and writes.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write().await;
        if *current != state {
            tracing::debug!(version = %self.config.version, from = %*current, to = %state, "worker state change");
            *current = state;
        }
    }

    /// Stop scheduling cache writes and wait for the ones already queued.
    ///
    /// Once this returns the worker never touches its generation again,
    /// so a newer version can purge it safely.
    pub(crate) async fn close_writes(&self) {
        self.writes_closed.store(true, Ordering::SeqCst);
        self.settle().await;
    }

    /// Undo [`ServiceWorker::close_writes`] after a takeover that did not happen.
    pub(crate) fn reopen_writes(&self) {
        self.writes_closed.store(false, Ordering::SeqCst);
    }

    pub(crate) fn writes_closed(&self) -> bool {
        self.writes_closed.load(Ordering::SeqCst)
    }

    /// Wait for every background cache write scheduled so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.pending_writes.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!(version = %self.config.version, error = %e, "cache write task aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::MockFetcher;
    use sharecache_core::MemoryStore;

    #[test]
    fn test_worker_config_from_app_config() {
        let app = AppConfig {
            cache_version: "share-tracker-v8".into(),
            worker_url: "https://shares.example.com/app/service-worker.js".into(),
            precache_urls: vec!["https://cdn.example.com/lib.js".into()],
            skip_waiting_on_install: false,
            ..Default::default()
        };

        let config = WorkerConfig::from_app_config(&app).unwrap();
        assert_eq!(config.version, "share-tracker-v8");
        assert_eq!(config.precache.len(), 1);
        assert_eq!(config.precache[0].as_str(), "https://cdn.example.com/lib.js");
        assert_eq!(config.worker_url.path(), "/app/service-worker.js");
        assert!(!config.skip_waiting_on_install);
    }

    #[test]
    fn test_worker_config_rejects_bad_precache_url() {
        let app = AppConfig { precache_urls: vec!["not a url".into()], ..Default::default() };
        assert!(matches!(WorkerConfig::from_app_config(&app), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_new_worker_is_parsed() {
        let config = WorkerConfig::new("v1", Url::parse("https://shares.example.com/app/service-worker.js").unwrap());
        let worker =
            ServiceWorker::new(config, Arc::new(MemoryStore::new()), Arc::new(MockFetcher::new()), Clients::new())
                .unwrap();

        assert_eq!(worker.state().await, WorkerState::Parsed);
        assert_eq!(worker.version(), "v1");
        assert_eq!(worker.scope().base_path(), "/app/");
    }

    #[test]
    fn test_custom_shell_assets() {
        let config = WorkerConfig::new("v1", Url::parse("https://shares.example.com/service-worker.js").unwrap())
            .with_shell_assets(vec!["app.js".into()]);
        let worker =
            ServiceWorker::new(config, Arc::new(MemoryStore::new()), Arc::new(MockFetcher::new()), Clients::new())
                .unwrap();

        assert!(worker.scope().is_shell_url(&Url::parse("https://shares.example.com/app.js").unwrap()));
        assert!(!worker.scope().is_shell_url(&Url::parse("https://shares.example.com/script.js").unwrap()));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert_eq!(WorkerState::Redundant.to_string(), "redundant");
    }
}
