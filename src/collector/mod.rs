//! Paginated collection of remote activity
//!
//! The remote source serves listings newest-first. The collector reads the
//! first page to learn where the listing ends, jumps to the last page and
//! walks back through `prev` links, reversing every page, so the result is
//! oldest-first overall. Every fetch and pause is bounded by the run's
//! cancellation token and optional deadline.

pub mod config;
pub mod error;

pub use config::CollectorConfig;
pub use error::{CollectError, CollectResult};

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::activity::{CommitParticipationSeries, StarEvent};
use crate::source::{ActivitySource, Page, RepoRef, ResourceKind};

const FIRST_PAGE: u32 = 1;

/// Cancellation and deadline shared by all requests of one collection
struct RunGuard {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    budget: Duration,
}

impl RunGuard {
    fn new(cancel: &CancellationToken, budget: Option<Duration>) -> Self {
        Self {
            cancel: cancel.clone(),
            deadline: budget.map(|b| Instant::now() + b),
            budget: budget.unwrap_or_default(),
        }
    }

    async fn run<F: Future>(&self, fut: F) -> CollectResult<F::Output> {
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| CollectError::DeadlineExceeded(self.budget)),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CollectError::Cancelled),
            result = bounded => result,
        }
    }
}

/// Walks paginated listings of an activity source
pub struct PaginatedCollector {
    source: Arc<dyn ActivitySource>,
    config: CollectorConfig,
}

impl PaginatedCollector {
    pub fn new(source: Arc<dyn ActivitySource>, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    async fn fetch(&self, guard: &RunGuard, repo: &RepoRef, kind: ResourceKind, page: u32) -> CollectResult<Page> {
        let page_data = guard
            .run(self.source.fetch_page(repo, kind, page))
            .await?
            .map_err(|e| CollectError::page(kind, page, e))?;
        debug!("{}: {} page {} returned {} records", repo, kind, page, page_data.len());
        Ok(page_data)
    }

    async fn pause(&self, guard: &RunGuard) -> CollectResult<()> {
        if !self.config.page_delay.is_zero() {
            guard.run(tokio::time::sleep(self.config.page_delay)).await?;
        }
        Ok(())
    }

    /// Collect the whole listing of `kind`, oldest record first
    pub async fn collect_history(
        &self,
        repo: &RepoRef,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> CollectResult<Vec<DateTime<Utc>>> {
        let guard = RunGuard::new(cancel, self.config.deadline);

        let first = self.fetch(&guard, repo, kind, FIRST_PAGE).await?;
        let last = match first.info.last {
            Some(last) if last > FIRST_PAGE => last,
            _ => {
                debug!("{}: {} fit on a single page", repo, kind);
                return Ok(first.records.into_iter().rev().collect());
            }
        };

        if last > self.config.max_pages {
            return Err(CollectError::PageLimitExceeded {
                kind,
                pages: last,
                limit: self.config.max_pages,
            });
        }

        let mut history = Vec::with_capacity(first.len() * last as usize);
        let first_records = first.records;
        let mut index = last;
        let mut fetched = 0u32;

        // Every backward page must link to the one directly before it,
        // down to page 2. Anything else would leave holes in the history.
        loop {
            if fetched > 0 {
                self.pause(&guard).await?;
            }
            let page = self.fetch(&guard, repo, kind, index).await?;
            fetched += 1;
            history.extend(page.records.into_iter().rev());

            let expected = index - 1;
            match page.info.prev {
                Some(prev) if prev == expected => {}
                prev => {
                    return Err(CollectError::InconsistentPagination { kind, page: index, prev });
                }
            }

            if expected == FIRST_PAGE {
                break;
            }
            index = expected;
        }

        history.extend(first_records.into_iter().rev());

        info!("{}: collected {} {} records from {} pages", repo, history.len(), kind, fetched + 1);
        Ok(history)
    }

    /// Full stargazer history, oldest first
    pub async fn collect_stargazers(&self, repo: &RepoRef, cancel: &CancellationToken) -> CollectResult<Vec<StarEvent>> {
        let history = self.collect_history(repo, ResourceKind::Stargazers, cancel).await?;
        Ok(history.into_iter().map(StarEvent::from).collect())
    }

    /// Trailing 52-week commit series, fetched in one call
    pub async fn collect_commit_participation(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> CollectResult<CommitParticipationSeries> {
        let guard = RunGuard::new(cancel, self.config.deadline);
        guard
            .run(self.source.fetch_participation(repo))
            .await?
            .map_err(|e| CollectError::request("commit participation", e))
    }

    /// Total number of commits, derived from the size of the first and last
    /// pages of the commit listing
    pub async fn count_total_commits(&self, repo: &RepoRef, cancel: &CancellationToken) -> CollectResult<u64> {
        let guard = RunGuard::new(cancel, self.config.deadline);

        let first = self.fetch(&guard, repo, ResourceKind::Commits, FIRST_PAGE).await?;
        let total = match first.info.last {
            Some(last) if last > FIRST_PAGE => {
                let last_page = self.fetch(&guard, repo, ResourceKind::Commits, last).await?;
                (last - 1) as u64 * first.len() as u64 + last_page.len() as u64
            }
            _ => first.len() as u64,
        };

        debug!("{}: {} commits in total", repo, total);
        Ok(total)
    }
}
