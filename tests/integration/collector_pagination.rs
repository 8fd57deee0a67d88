//! Paginated Collector Integration Tests

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use common::{history, metadata, utc, FakeRepository, FakeSource};
use gitometer::activity::CommitParticipationSeries;
use gitometer::collector::{CollectError, CollectorConfig, PaginatedCollector};
use gitometer::source::{
    ActivitySource, Page, PageInfo, RepoRef, RepositoryMetadata, ResourceKind, SourceResult,
};

fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets").unwrap()
}

fn source_with_stars(stars: Vec<DateTime<Utc>>, per_page: usize) -> Arc<FakeSource> {
    Arc::new(
        FakeSource::new(per_page)
            .with_repository(FakeRepository::new(metadata("octo", "widgets", utc(2020, 1, 1), 0)).with_stargazers(stars)),
    )
}

fn collect(source: Arc<FakeSource>, config: CollectorConfig) -> Result<Vec<DateTime<Utc>>, CollectError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        PaginatedCollector::new(source, config)
            .collect_history(&repo(), ResourceKind::Stargazers, &CancellationToken::new())
            .await
    })
}

proptest! {
    #[test]
    fn prop_collection_is_oldest_first(count in 0usize..120, per_page in 1usize..15) {
        let stars = history(utc(2021, 3, 1), count, 5);
        let source = source_with_stars(stars.clone(), per_page);

        let collected = collect(source.clone(), CollectorConfig::unthrottled()).unwrap();
        prop_assert_eq!(&collected, &stars);
        prop_assert!(collected.windows(2).all(|w| w[0] <= w[1]));

        // page 1 once, then from the last page down to page 2
        let pages = count.div_ceil(per_page).max(1) as u32;
        let mut expected = vec![1];
        expected.extend((2..=pages).rev());
        prop_assert_eq!(source.pages_requested("octo/widgets", ResourceKind::Stargazers), expected);
    }
}

#[test]
fn test_page_cap_fails_fast() {
    let source = source_with_stars(history(utc(2021, 3, 1), 100, 5), 10);
    let result = collect(source.clone(), CollectorConfig::unthrottled().with_max_pages(5));

    assert!(matches!(result, Err(CollectError::PageLimitExceeded { pages: 10, limit: 5, .. })));
    assert_eq!(source.pages_requested("octo/widgets", ResourceKind::Stargazers), vec![1]);
}

#[test]
fn test_page_cap_at_exact_size_succeeds() {
    let source = source_with_stars(history(utc(2021, 3, 1), 100, 5), 10);
    let result = collect(source, CollectorConfig::unthrottled().with_max_pages(10));
    assert_eq!(assert_ok!(result).len(), 100);
}

/// Source with `last` pages whose backward links are scripted per page.
/// Pages without a scripted link point at the page before them.
struct ScriptedLinksSource {
    last: u32,
    links: HashMap<u32, Option<u32>>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedLinksSource {
    fn new(last: u32, links: &[(u32, Option<u32>)]) -> Self {
        Self {
            last,
            links: links.iter().copied().collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySource for ScriptedLinksSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_repository(&self, _repo: &RepoRef) -> SourceResult<RepositoryMetadata> {
        Ok(metadata("octo", "widgets", utc(2020, 1, 1), 0))
    }

    async fn fetch_page(&self, _repo: &RepoRef, _kind: ResourceKind, page: u32) -> SourceResult<Page> {
        self.requested.lock().unwrap().push(page);
        let prev = match self.links.get(&page) {
            Some(link) => *link,
            None => (page > 1).then(|| page - 1),
        };
        let info = PageInfo {
            first: 1,
            last: (page < self.last).then_some(self.last),
            prev,
            next: (page < self.last).then(|| page + 1),
        };
        Ok(Page::new(vec![utc(2022, 1, page)], info))
    }

    async fn fetch_participation(&self, _repo: &RepoRef) -> SourceResult<CommitParticipationSeries> {
        Ok(CommitParticipationSeries::default())
    }
}

async fn collect_scripted(source: Arc<ScriptedLinksSource>) -> Result<Vec<DateTime<Utc>>, CollectError> {
    PaginatedCollector::new(source, CollectorConfig::unthrottled())
        .collect_history(&repo(), ResourceKind::Stargazers, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_non_decreasing_prev_link_is_rejected() {
    let source = Arc::new(ScriptedLinksSource::new(3, &[(3, Some(3))]));

    let err = assert_err!(collect_scripted(source).await);
    assert!(matches!(err, CollectError::InconsistentPagination { page: 3, prev: Some(3), .. }));
}

#[tokio::test]
async fn test_prev_link_skipping_pages_is_rejected() {
    let source = Arc::new(ScriptedLinksSource::new(4, &[(4, Some(2))]));

    let err = assert_err!(collect_scripted(source.clone()).await);
    assert!(matches!(err, CollectError::InconsistentPagination { page: 4, prev: Some(2), .. }));
    // page 3 would have been skipped
    assert_eq!(source.requested(), vec![1, 4]);
}

#[tokio::test]
async fn test_missing_prev_link_above_page_two_is_rejected() {
    let source = Arc::new(ScriptedLinksSource::new(4, &[(3, None)]));

    let err = assert_err!(collect_scripted(source.clone()).await);
    assert!(matches!(err, CollectError::InconsistentPagination { page: 3, prev: None, .. }));
    assert_eq!(source.requested(), vec![1, 4, 3]);
}

#[tokio::test]
async fn test_consistent_links_collect_every_page() {
    let source = Arc::new(ScriptedLinksSource::new(4, &[]));

    let history = assert_ok!(collect_scripted(source.clone()).await);
    assert_eq!(history, vec![utc(2022, 1, 4), utc(2022, 1, 3), utc(2022, 1, 2), utc(2022, 1, 1)]);
    assert_eq!(source.requested(), vec![1, 4, 3, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_page_delay() {
    let source = source_with_stars(history(utc(2021, 3, 1), 50, 5), 5);
    let collector = PaginatedCollector::new(
        source.clone(),
        CollectorConfig::unthrottled().with_page_delay(Duration::from_secs(60)),
    );
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            cancel.cancel();
        })
    };

    let result = collector
        .collect_history(&repo(), ResourceKind::Stargazers, &cancel)
        .await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(CollectError::Cancelled)));
    // 1 and 10 immediately, 9 after the first pause; cancelled during the second
    assert_eq!(source.pages_requested("octo/widgets", ResourceKind::Stargazers), vec![1, 10, 9]);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_covers_slow_source() {
    let source = Arc::new(
        FakeSource::new(5)
            .with_latency(Duration::from_secs(20))
            .with_repository(
                FakeRepository::new(metadata("octo", "widgets", utc(2020, 1, 1), 0))
                    .with_stargazers(history(utc(2021, 3, 1), 50, 5)),
            ),
    );
    let collector = PaginatedCollector::new(
        source,
        CollectorConfig::unthrottled().with_deadline(Some(Duration::from_secs(70))),
    );

    let result = collector
        .collect_history(&repo(), ResourceKind::Stargazers, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(CollectError::DeadlineExceeded(_))));
}

#[tokio::test]
async fn test_total_commits_exact_multiple_of_page_size() {
    let source = Arc::new(
        FakeSource::new(10).with_repository(
            FakeRepository::new(metadata("octo", "widgets", utc(2020, 1, 1), 0))
                .with_commits(history(utc(2021, 3, 1), 40, 5)),
        ),
    );
    let collector = PaginatedCollector::new(source, CollectorConfig::unthrottled());

    let total = collector.count_total_commits(&repo(), &CancellationToken::new()).await.unwrap();
    assert_eq!(total, 40);
}
