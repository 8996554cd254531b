//! Active and waiting worker versions for one scope.
//!
//! Install always completes before activation starts: both run under the
//! registration's lifecycle lock, and a version whose install fails never
//! replaces the one in control.

use serde_json::Value;
use sharecache_core::{Error, SnapshotStore};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::clients::{ClientId, Clients};
use super::lifecycle::ActivateReport;
use super::message::ControlMessage;
use super::strategy::FetchOutcome;
use super::{ServiceWorker, WorkerConfig, WorkerState};
use crate::Fetcher;
use crate::fetch::AssetRequest;

/// Registration of the offline cache worker for a scope.
pub struct Registration {
    store: Arc<dyn SnapshotStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Clients,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
    lifecycle: Mutex<()>,
}

impl Registration {
    pub fn new(store: Arc<dyn SnapshotStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            clients: Clients::new(),
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    /// Install a new version and activate it if it skips waiting or nothing is active.
    ///
    /// Otherwise the version is parked as the waiting worker until a
    /// [`ControlMessage::SkipWaiting`] arrives. A failed install leaves the
    /// current active worker untouched.
    pub async fn register(&self, config: WorkerConfig) -> Result<Arc<ServiceWorker>, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let worker = Arc::new(ServiceWorker::new(
            config,
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
            self.clients.clone(),
        )?);

        worker.install().await?;

        if let Some(previous) = self.waiting.write().await.take() {
            tracing::info!(version = previous.version(), "waiting worker replaced by newer install");
            previous.set_state(WorkerState::Redundant).await;
        }

        let has_active = self.active.read().await.is_some();
        if worker.skips_waiting() || !has_active {
            if let Err(e) = self.promote(&worker).await {
                tracing::warn!(version = worker.version(), error = %e, "activation failed; worker left waiting");
                *self.waiting.write().await = Some(Arc::clone(&worker));
                return Err(e);
            }
        } else {
            tracing::info!(version = worker.version(), "worker installed; waiting for skip-waiting");
            *self.waiting.write().await = Some(Arc::clone(&worker));
        }

        Ok(worker)
    }

    /// Hand control to `worker`.
    ///
    /// The previous active worker stops writing and drains its queued writes
    /// before activation purges its generation. On failure it keeps control.
    async fn promote(&self, worker: &Arc<ServiceWorker>) -> Result<ActivateReport, Error> {
        let previous = self.active().await.filter(|p| !Arc::ptr_eq(p, worker));
        if let Some(previous) = &previous {
            previous.close_writes().await;
        }

        let report = match worker.activate().await {
            Ok(report) => report,
            Err(e) => {
                if let Some(previous) = &previous {
                    previous.reopen_writes();
                }
                return Err(e);
            }
        };

        *self.active.write().await = Some(Arc::clone(worker));
        if let Some(previous) = previous {
            previous.set_state(WorkerState::Redundant).await;
        }

        Ok(report)
    }

    /// Deliver a posted message to the waiting worker, or the active one if none waits.
    ///
    /// A waiting worker that accepts skip-waiting is activated before this
    /// returns. If activation fails it stays waiting.
    pub async fn post_message(&self, value: &Value) -> Result<Option<ControlMessage>, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        if let Some(waiting) = self.waiting().await {
            let handled = waiting.handle_message(value).await;
            if waiting.skips_waiting() {
                self.promote(&waiting).await?;
                self.waiting.write().await.take();
            }
            return Ok(handled);
        }

        match self.active().await {
            Some(active) => Ok(active.handle_message(value).await),
            None => Err(Error::NoController("no worker installed".into())),
        }
    }

    /// Open a page in the scope. It is controlled by the active version, if any.
    pub async fn open_client(&self) -> ClientId {
        let controller = self.active().await.map(|w| w.version().to_string());
        self.clients.open(controller).await
    }

    /// Route a request from a page in the scope.
    ///
    /// With no active worker the request goes straight to the network.
    pub async fn fetch(&self, request: &AssetRequest) -> FetchOutcome {
        match self.active().await {
            Some(worker) => worker.handle_fetch(request).await,
            None => match self.fetcher.fetch(request).await {
                Ok(response) => FetchOutcome::Network(response),
                Err(e) => FetchOutcome::Failed(e),
            },
        }
    }

    /// Wait for the active worker's background cache writes.
    pub async fn settle(&self) {
        if let Some(worker) = self.active().await {
            worker.settle().await;
        }
    }
}
