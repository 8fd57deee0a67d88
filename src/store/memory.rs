//! In-memory snapshot store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{sort_summaries, SnapshotStore, StoreError, StoreResult};
use crate::aggregation::{RepositorySnapshot, RepositorySummary};
use crate::source::RepoRef;

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<BTreeMap<String, RepositorySnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = RepositorySnapshot>) -> Self {
        let map = snapshots.into_iter().map(|s| (s.key(), s)).collect();
        Self { snapshots: RwLock::new(map) }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn find(&self, repo: &RepoRef) -> StoreResult<Option<RepositorySnapshot>> {
        Ok(self.snapshots.read().get(&repo.key()).cloned())
    }

    async fn insert(&self, snapshot: RepositorySnapshot) -> StoreResult<()> {
        let mut snapshots = self.snapshots.write();
        let key = snapshot.key();
        if snapshots.contains_key(&key) {
            return Err(StoreError::AlreadyExists { repository: key });
        }
        snapshots.insert(key, snapshot);
        Ok(())
    }

    async fn update(&self, snapshot: RepositorySnapshot) -> StoreResult<()> {
        let mut snapshots = self.snapshots.write();
        match snapshots.get_mut(&snapshot.key()) {
            Some(existing) => {
                *existing = snapshot;
                Ok(())
            }
            None => Err(StoreError::not_found(snapshot.key())),
        }
    }

    async fn list_summaries(&self) -> StoreResult<Vec<RepositorySummary>> {
        let mut summaries: Vec<_> = self.snapshots.read().values().map(|s| s.summary()).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}
