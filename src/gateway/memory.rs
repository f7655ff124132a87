use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::gateway::WatchStore;
use crate::models::{WatchState, WatchlistEntry};
use crate::utils::error::Result;

/// In-memory watch store for tests and for callers that own their
/// persistence (the engine never assumes a storage medium). Entries are
/// kept in insertion order so bulk activation processes oldest first.
#[derive(Clone, Default)]
pub struct MemoryWatchStore {
    entries: Arc<RwLock<Vec<WatchlistEntry>>>,
}

impl MemoryWatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with previously persisted entries.
    pub fn with_entries(entries: Vec<WatchlistEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Snapshot of every entry, for callers that persist the store
    /// themselves.
    pub async fn dump(&self) -> Vec<WatchlistEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn insert(&self, entry: WatchlistEntry) -> Result<WatchlistEntry> {
        let mut entries = self.entries.write().await;
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: &str) -> Result<Option<WatchlistEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_temp(&self) -> Result<Vec<WatchlistEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.state == WatchState::Temp)
            .cloned()
            .collect())
    }

    async fn list_activated(&self, email: &str) -> Result<Vec<WatchlistEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.state == WatchState::Activated && e.is_bound_to(email))
            .cloned()
            .collect())
    }

    async fn count_activated(&self, email: &str) -> Result<usize> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.state == WatchState::Activated && e.is_bound_to(email))
            .count())
    }

    async fn activate(&self, id: &str, email: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.state == WatchState::Temp => {
                entry.activate(email);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.id != id);
        Ok(())
    }
}
