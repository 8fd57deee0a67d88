//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use gitometer::activity::CommitParticipationSeries;
use gitometer::aggregation::RepositorySnapshot;
use gitometer::source::{
    ActivitySource, Page, PageInfo, RepoRef, RepositoryMetadata, ResourceKind, SourceError, SourceResult,
};

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// `count` timestamps spaced `hours` apart starting at `start`, oldest first
pub fn history(start: DateTime<Utc>, count: usize, hours: i64) -> Vec<DateTime<Utc>> {
    (0..count as i64).map(|i| start + ChronoDuration::hours(i * hours)).collect()
}

pub fn metadata(owner: &str, name: &str, created_at: DateTime<Utc>, stars: u64) -> RepositoryMetadata {
    RepositoryMetadata {
        id: 1000,
        owner: owner.to_string(),
        name: name.to_string(),
        default_branch: "main".to_string(),
        description: Some(format!("{} test fixture", name)),
        created_at,
        stargazers_count: stars,
    }
}

/// One repository as the fake remote serves it
#[derive(Clone)]
pub struct FakeRepository {
    pub metadata: RepositoryMetadata,
    pub stargazers: Vec<DateTime<Utc>>,
    pub commits: Vec<DateTime<Utc>>,
    pub participation: Vec<u64>,
}

impl FakeRepository {
    pub fn new(metadata: RepositoryMetadata) -> Self {
        Self {
            metadata,
            stargazers: Vec::new(),
            commits: Vec::new(),
            participation: vec![0; 52],
        }
    }

    pub fn with_stargazers(mut self, stargazers: Vec<DateTime<Utc>>) -> Self {
        self.stargazers = stargazers;
        self
    }

    pub fn with_commits(mut self, commits: Vec<DateTime<Utc>>) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_participation(mut self, weeks: Vec<u64>) -> Self {
        self.participation = weeks;
        self
    }
}

/// Remote source replaying chronological histories as GitHub would page them:
/// page 1 is the newest, each page is newest-first
pub struct FakeSource {
    repositories: HashMap<String, FakeRepository>,
    per_page: usize,
    latency: Duration,
    failing: HashSet<(String, ResourceKind, u32)>,
    calls: Mutex<Vec<(String, ResourceKind, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new(per_page: usize) -> Self {
        Self {
            repositories: HashMap::new(),
            per_page: per_page.max(1),
            latency: Duration::ZERO,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_repository(mut self, repository: FakeRepository) -> Self {
        let key = format!("{}/{}", repository.metadata.owner, repository.metadata.name).to_lowercase();
        self.repositories.insert(key, repository);
        self
    }

    /// Every request takes `latency` to answer
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, repo: &str, kind: ResourceKind, page: u32) -> Self {
        self.failing.insert((repo.to_lowercase(), kind, page));
        self
    }

    pub fn calls(&self) -> Vec<(String, ResourceKind, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, repo: &str, kind: ResourceKind) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(r, k, _)| r == &repo.to_lowercase() && *k == kind)
            .map(|(_, _, page)| page)
            .collect()
    }

    /// Highest number of requests observed at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn repository(&self, repo: &RepoRef) -> SourceResult<&FakeRepository> {
        self.repositories
            .get(&repo.key())
            .ok_or_else(|| SourceError::not_found(repo.to_string()))
    }

    async fn respond(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_repository(&self, repo: &RepoRef) -> SourceResult<RepositoryMetadata> {
        self.respond().await;
        Ok(self.repository(repo)?.metadata.clone())
    }

    async fn fetch_page(&self, repo: &RepoRef, kind: ResourceKind, page: u32) -> SourceResult<Page> {
        self.calls.lock().unwrap().push((repo.key(), kind, page));
        self.respond().await;

        if self.failing.contains(&(repo.key(), kind, page)) {
            return Err(SourceError::Http {
                url: format!("https://fake.test/repos/{}/{}?page={}", repo, kind, page),
                status: 502,
            });
        }

        let repository = self.repository(repo)?;
        let history = match kind {
            ResourceKind::Stargazers => &repository.stargazers,
            ResourceKind::Commits => &repository.commits,
        };

        let newest_first: Vec<_> = history.iter().rev().copied().collect();
        let pages: Vec<Vec<DateTime<Utc>>> = newest_first.chunks(self.per_page).map(|c| c.to_vec()).collect();
        let count = pages.len().max(1) as u32;
        let records = pages.get(page as usize - 1).cloned().unwrap_or_default();

        let info = PageInfo {
            first: 1,
            last: (page < count).then_some(count),
            prev: (page > 1).then(|| page - 1),
            next: (page < count).then(|| page + 1),
        };

        Ok(Page::new(records, info))
    }

    async fn fetch_participation(&self, repo: &RepoRef) -> SourceResult<CommitParticipationSeries> {
        self.respond().await;
        Ok(CommitParticipationSeries::new(self.repository(repo)?.participation.clone()))
    }
}

pub fn assert_series_is_cumulative(snapshot: &RepositorySnapshot) {
    let series = &snapshot.stars_per_month;
    assert_eq!(series.labels.len(), series.data.len());
    assert!(series.data.windows(2).all(|w| w[0] <= w[1]), "series must be non-decreasing: {:?}", series.data);
}
