//! Open page clients and which worker version controls each.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Identifier of an open page.
pub type ClientId = u64;

/// Shared registry of open pages. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Clients {
    controllers: Arc<RwLock<BTreeMap<ClientId, Option<String>>>>,
    next_id: Arc<AtomicU64>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened page, optionally already controlled by `version`.
    pub async fn open(&self, controller: Option<String>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.controllers.write().await.insert(id, controller);
        id
    }

    /// Forget a closed page. Returns whether it was open.
    pub async fn close(&self, id: ClientId) -> bool {
        self.controllers.write().await.remove(&id).is_some()
    }

    /// Put every open page under `version`'s control. Returns how many changed hands.
    pub async fn claim(&self, version: &str) -> usize {
        let mut controllers = self.controllers.write().await;
        let mut claimed = 0;
        for controller in controllers.values_mut() {
            if controller.as_deref() != Some(version) {
                *controller = Some(version.to_string());
                claimed += 1;
            }
        }
        claimed
    }

    /// Version controlling the page, if any.
    pub async fn controller(&self, id: ClientId) -> Option<String> {
        self.controllers.read().await.get(&id).cloned().flatten()
    }

    pub async fn count(&self) -> usize {
        self.controllers.read().await.len()
    }

    /// Number of open pages no worker controls.
    pub async fn uncontrolled(&self) -> usize {
        self.controllers.read().await.values().filter(|c| c.is_none()).count()
    }
}
