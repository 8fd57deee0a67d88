//! JSON file snapshot store
//!
//! The whole store is a single pretty-printed JSON document. It is loaded
//! once on open and rewritten after every change through a temporary file
//! in the same directory followed by a rename, so readers never observe a
//! half-written document.

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::{sort_summaries, SnapshotStore, StoreError, StoreResult};
use crate::aggregation::{RepositorySnapshot, RepositorySummary};
use crate::source::RepoRef;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    snapshots: BTreeMap<String, RepositorySnapshot>,
}

pub struct JsonFileStore {
    path: PathBuf,
    snapshots: Mutex<BTreeMap<String, RepositorySnapshot>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshots = match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => {
                let document: StoreDocument =
                    serde_json::from_str(&content).map_err(|e| StoreError::corrupt(&path, e))?;
                debug!("Loaded {} snapshots from {}", document.snapshots.len(), path.display());
                document.snapshots
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Snapshot store {} does not exist yet", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        Ok(Self {
            path,
            snapshots: Mutex::new(snapshots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshots.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, snapshots: &BTreeMap<String, RepositorySnapshot>) -> StoreResult<()> {
        #[derive(Serialize)]
        struct DocumentRef<'a> {
            version: u32,
            snapshots: &'a BTreeMap<String, RepositorySnapshot>,
        }

        let content = serde_json::to_string_pretty(&DocumentRef {
            version: STORE_VERSION,
            snapshots,
        })
        .map_err(|e| StoreError::corrupt(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, content).await.map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        debug!("Wrote {} snapshots to {}", snapshots.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn find(&self, repo: &RepoRef) -> StoreResult<Option<RepositorySnapshot>> {
        Ok(self.snapshots.lock().await.get(&repo.key()).cloned())
    }

    async fn insert(&self, snapshot: RepositorySnapshot) -> StoreResult<()> {
        let mut snapshots = self.snapshots.lock().await;
        let key = snapshot.key();
        if snapshots.contains_key(&key) {
            return Err(StoreError::AlreadyExists { repository: key });
        }

        snapshots.insert(key.clone(), snapshot);
        if let Err(e) = self.persist(&snapshots).await {
            snapshots.remove(&key);
            return Err(e);
        }
        Ok(())
    }

    async fn update(&self, snapshot: RepositorySnapshot) -> StoreResult<()> {
        let mut snapshots = self.snapshots.lock().await;
        let key = snapshot.key();
        let previous = match snapshots.get_mut(&key) {
            Some(existing) => std::mem::replace(existing, snapshot),
            None => return Err(StoreError::not_found(key)),
        };

        if let Err(e) = self.persist(&snapshots).await {
            snapshots.insert(key, previous);
            return Err(e);
        }
        Ok(())
    }

    async fn list_summaries(&self) -> StoreResult<Vec<RepositorySummary>> {
        let mut summaries: Vec<_> = self.snapshots.lock().await.values().map(|s| s.summary()).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}
