//! Per-repository aggregation pipeline

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::{AggregateError, AggregateResult};
use super::snapshot::RepositorySnapshot;
use crate::activity::{months_between, StarActivity};
use crate::collector::{CollectorConfig, PaginatedCollector};
use crate::source::{ActivitySource, RepoRef};

/// Drives metadata, participation, stargazer and commit collection for one
/// repository and assembles the snapshot
pub struct Aggregator {
    source: Arc<dyn ActivitySource>,
    collector: PaginatedCollector,
}

impl Aggregator {
    pub fn new(source: Arc<dyn ActivitySource>, config: CollectorConfig) -> Self {
        let collector = PaginatedCollector::new(Arc::clone(&source), config);
        Self { source, collector }
    }

    pub async fn aggregate(&self, owner: &str, name: &str, cancel: &CancellationToken) -> AggregateResult<RepositorySnapshot> {
        self.aggregate_at(owner, name, cancel, Utc::now()).await
    }

    /// Aggregate against a fixed clock
    pub async fn aggregate_at(
        &self,
        owner: &str,
        name: &str,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AggregateResult<RepositorySnapshot> {
        let repo = RepoRef::new(owner, name)?;
        self.aggregate_repo(&repo, cancel, now).await
    }

    pub async fn aggregate_repo(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AggregateResult<RepositorySnapshot> {
        let run_id = Uuid::now_v7();
        let started = Instant::now();
        info!("[{}] Aggregating {} from {}", run_id, repo, self.source.name());

        let result = self.run_pipeline(repo, cancel, now).await;

        match &result {
            Ok(snapshot) => info!(
                "[{}] Aggregated {} in {:.2?}: {} stars, {} commits",
                run_id,
                repo,
                started.elapsed(),
                snapshot.total_stars,
                snapshot.total_commits
            ),
            Err(e) if e.is_cancelled() => warn!("[{}] Aggregation of {} cancelled", run_id, repo),
            Err(e) => warn!("[{}] Aggregation of {} failed: {}", run_id, repo, e),
        }

        result
    }

    async fn run_pipeline(&self, repo: &RepoRef, cancel: &CancellationToken, now: DateTime<Utc>) -> AggregateResult<RepositorySnapshot> {
        let metadata = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(crate::collector::CollectError::Cancelled.into()),
            result = self.source.fetch_repository(repo) => {
                result.map_err(|e| AggregateError::metadata(repo.to_string(), e))?
            }
        };
        let age = months_between(metadata.created_at, now);
        debug!("{}: created {} ({} months ago)", repo, metadata.created_at, age);

        let participation = self.collector.collect_commit_participation(repo, cancel).await?;
        let commit_counts = participation.window_counts();

        let stars = self.collector.collect_stargazers(repo, cancel).await?;
        let star_activity = StarActivity::from_events(&stars, now);
        debug!(
            "{}: {} star events across {} months",
            repo,
            stars.len(),
            star_activity.series.len()
        );

        let total_commits = self.collector.count_total_commits(repo, cancel).await?;

        Ok(RepositorySnapshot {
            id: metadata.id,
            owner_name: metadata.owner,
            name: metadata.name,
            default_branch: metadata.default_branch,
            description: metadata.description,
            created_at: metadata.created_at,
            repository_created_months_ago: age,
            total_stars: metadata.stargazers_count,
            total_commits,
            star_counts: star_activity.windows,
            commit_counts,
            stars_per_month: star_activity.series,
            aggregated_at: now,
        })
    }
}
