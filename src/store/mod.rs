//! Snapshot persistence
//!
//! Snapshots are keyed by the case-insensitive `owner/name` of the
//! repository. The store is the only state shared between concurrent
//! aggregations, so implementations synchronize internally.

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::debug;

use crate::activity::MIN_INITIALIZED_AGE_MONTHS;
use crate::aggregation::{RepositorySnapshot, RepositorySummary};
use crate::source::RepoRef;

/// Which path an upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn find(&self, repo: &RepoRef) -> StoreResult<Option<RepositorySnapshot>>;

    /// Insert a snapshot for a repository that is not stored yet
    async fn insert(&self, snapshot: RepositorySnapshot) -> StoreResult<()>;

    /// Replace the stored snapshot of a repository
    async fn update(&self, snapshot: RepositorySnapshot) -> StoreResult<()>;

    /// All stored repositories, most stars first
    async fn list_summaries(&self) -> StoreResult<Vec<RepositorySummary>>;

    /// Insert or update by owner and name
    async fn upsert_snapshot(&self, snapshot: RepositorySnapshot) -> StoreResult<UpsertOutcome> {
        let repo = snapshot.repo_ref()?;

        if self.find(&repo).await?.is_some() {
            debug!("Updating stored snapshot of {}", repo);
            self.update(snapshot).await?;
            return Ok(UpsertOutcome::Updated);
        }

        debug!("Inserting snapshot of {}", repo);
        match self.insert(snapshot.clone()).await {
            Ok(()) => Ok(UpsertOutcome::Inserted),
            // Another pipeline stored it between the lookup and the insert
            Err(StoreError::AlreadyExists { .. }) => {
                self.update(snapshot).await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(e) => Err(e),
        }
    }

    /// Stored snapshot, provided the repository passed the initialization gate
    async fn fetch_initialized(&self, repo: &RepoRef) -> StoreResult<RepositorySnapshot> {
        let snapshot = self
            .find(repo)
            .await?
            .ok_or_else(|| StoreError::not_found(repo.to_string()))?;

        if !snapshot.is_initialized() {
            return Err(StoreError::NotInitialized {
                repository: repo.to_string(),
                months: snapshot.repository_created_months_ago,
                required: MIN_INITIALIZED_AGE_MONTHS,
            });
        }

        Ok(snapshot)
    }
}

/// Sort summaries by stars descending, then by name for a stable listing
pub(crate) fn sort_summaries(summaries: &mut [RepositorySummary]) {
    summaries.sort_by(|a, b| {
        b.total_stars
            .cmp(&a.total_stars)
            .then_with(|| a.owner_name.to_lowercase().cmp(&b.owner_name.to_lowercase()))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}
