//! In-memory snapshot store.
//!
//! Same semantics as the SQLite store, backed by a `RwLock`ed list of
//! generations. Used in tests and anywhere persistence is not wanted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::store::SnapshotStore;
use super::{RequestKey, ResponseSnapshot};
use crate::Error;

#[derive(Debug, Default)]
struct Generation {
    name: String,
    entries: HashMap<RequestKey, ResponseSnapshot>,
    order: Vec<RequestKey>,
}

/// In-memory store. Clones share the same underlying generations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    generations: Arc<RwLock<Vec<Generation>>>,
    unavailable: Arc<AtomicBool>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail, as if storage were gone.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `put` fail while reads keep working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of entries in a generation, or `None` if it does not exist.
    pub async fn entry_count(&self, generation: &str) -> Option<usize> {
        let generations = self.generations.read().await;
        generations.iter().find(|g| g.name == generation).map(|g| g.entries.len())
    }

    fn check(&self) -> Result<(), Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Storage("storage unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.check()?;
        let mut generations = self.generations.write().await;
        if !generations.iter().any(|g| g.name == generation) {
            generations.push(Generation { name: generation.to_string(), ..Default::default() });
        }
        Ok(())
    }

    async fn match_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.check()?;
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == generation)
            .and_then(|g| g.entries.get(key))
            .cloned())
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.check()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(Error::Storage("storage is read-only".into()));
        }

        let mut generations = self.generations.write().await;
        let index = match generations.iter().position(|g| g.name == generation) {
            Some(index) => index,
            None => {
                generations.push(Generation { name: generation.to_string(), ..Default::default() });
                generations.len() - 1
            }
        };

        let target = &mut generations[index];
        if target.entries.insert(key.clone(), response.clone()).is_none() {
            target.order.push(key.clone());
        }
        Ok(())
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.check()?;
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.name != generation);
        Ok(generations.len() < before)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.check()?;
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn entry_keys(&self, generation: &str) -> Result<Vec<RequestKey>, Error> {
        self.check()?;
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == generation)
            .map(|g| g.order.clone())
            .unwrap_or_default())
    }
}
