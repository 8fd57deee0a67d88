//! Aggregation Pipeline Integration Tests
//!
//! Runs the whole pipeline against a replaying source: metadata, commit
//! participation, stargazer history and total commit count through to a
//! stored snapshot.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use common::{assert_series_is_cumulative, history, metadata, utc, FakeRepository, FakeSource};
use gitometer::aggregation::{AggregateError, Aggregator};
use gitometer::app::aggregate_repositories;
use gitometer::collector::{CollectError, CollectorConfig};
use gitometer::source::{RepoRef, ResourceKind};
use gitometer::store::{MemoryStore, SnapshotStore, UpsertOutcome};

fn widgets() -> FakeRepository {
    let mut participation = vec![0; 52];
    participation[51] = 5;

    FakeRepository::new(metadata("octo", "widgets", utc(2022, 6, 1), 4))
        .with_stargazers(vec![
            utc(2023, 1, 5),
            utc(2023, 1, 25),
            utc(2023, 3, 1),
            // after the last completed week: graphed, not counted
            utc(2023, 3, 14),
        ])
        .with_commits(history(utc(2022, 7, 1), 7, 24))
        .with_participation(participation)
}

#[tokio::test]
async fn test_snapshot_from_replayed_history() {
    let source = Arc::new(FakeSource::new(2).with_repository(widgets()));
    let aggregator = Aggregator::new(source.clone(), CollectorConfig::unthrottled());
    let now = Utc.with_ymd_and_hms(2023, 3, 15, 10, 0, 0).unwrap();

    let snapshot = aggregator
        .aggregate_at("octo", "widgets", &CancellationToken::new(), now)
        .await
        .unwrap();

    assert_eq!(snapshot.owner_name, "octo");
    assert_eq!(snapshot.total_stars, 4);
    assert_eq!(snapshot.repository_created_months_ago, 9);

    assert_eq!(snapshot.stars_per_month.labels, vec!["1 2023", "2 2023", "3 2023"]);
    assert_eq!(snapshot.stars_per_month.data, vec![2, 2, 4]);
    assert_series_is_cumulative(&snapshot);

    assert_eq!(snapshot.star_counts.last_week, 0);
    assert_eq!(snapshot.star_counts.last_4_weeks, 1);
    assert_eq!(snapshot.star_counts.last_12_months, 3);

    assert_eq!(snapshot.commit_counts.last_week, 5);
    assert_eq!(snapshot.commit_counts.last_4_weeks, 5);
    assert_eq!(snapshot.commit_counts.last_12_months, 5);
    assert_eq!(snapshot.total_commits, 7);

    // stargazers: first page, then last back to 2
    assert_eq!(source.pages_requested("octo/widgets", ResourceKind::Stargazers), vec![1, 2]);
    // commits: first and last page only
    assert_eq!(source.pages_requested("octo/widgets", ResourceKind::Commits), vec![1, 4]);
}

#[tokio::test]
async fn test_unknown_repository_fails_on_metadata() {
    let source = Arc::new(FakeSource::new(10));
    let aggregator = Aggregator::new(source.clone(), CollectorConfig::unthrottled());

    let err = aggregator
        .aggregate("octo", "missing", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AggregateError::Metadata { .. }));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_input_is_rejected_before_any_request() {
    let source = Arc::new(FakeSource::new(10).with_repository(widgets()));
    let aggregator = Aggregator::new(source.clone(), CollectorConfig::unthrottled());

    for (owner, name) in [("", "widgets"), ("octo", ""), ("oc to", "widgets"), ("octo", "wid/gets")] {
        let err = aggregator
            .aggregate(owner, name, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRepository(_)), "{}/{}", owner, name);
    }
    assert!(source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let mut source = FakeSource::new(5).with_latency(Duration::from_millis(100));
    let mut repos = Vec::new();
    for i in 0..6 {
        let name = format!("repo-{}", i);
        source = source.with_repository(
            FakeRepository::new(metadata("octo", &name, utc(2021, 1, 1), i))
                .with_stargazers(history(utc(2022, 1, 1), 12, 30))
                .with_commits(history(utc(2022, 1, 1), 3, 30)),
        );
        repos.push(RepoRef::new("octo", &name).unwrap());
    }

    let source = Arc::new(source);
    let aggregator = Arc::new(Aggregator::new(source.clone(), CollectorConfig::unthrottled()));
    let store = Arc::new(MemoryStore::new());

    let outcomes = aggregate_repositories(aggregator, store.clone(), repos.clone(), 2, &CancellationToken::new()).await;

    assert!(source.max_in_flight() <= 2, "saw {} concurrent requests", source.max_in_flight());
    assert!(source.max_in_flight() >= 1);
    assert!(outcomes.iter().all(|o| o.is_success()));
    let order: Vec<&RepoRef> = outcomes.iter().map(|o| &o.repo).collect();
    assert_eq!(order, repos.iter().collect::<Vec<_>>());
    assert_eq!(store.len(), 6);

    let listing = store.list_summaries().await.unwrap();
    assert_eq!(listing[0].name, "repo-5");
    assert_eq!(listing[5].name, "repo-0");
}

#[tokio::test]
async fn test_failure_is_isolated_to_one_pipeline() {
    let source = Arc::new(
        FakeSource::new(2)
            .with_repository(widgets())
            .with_repository(
                FakeRepository::new(metadata("octo", "gadgets", utc(2021, 1, 1), 9))
                    .with_stargazers(history(utc(2022, 1, 1), 9, 48)),
            )
            .failing_on("octo/gadgets", ResourceKind::Stargazers, 3),
    );
    let aggregator = Arc::new(Aggregator::new(source, CollectorConfig::unthrottled()));
    let store = Arc::new(MemoryStore::new());

    let repos = vec![
        RepoRef::new("octo", "gadgets").unwrap(),
        RepoRef::new("octo", "widgets").unwrap(),
    ];
    let outcomes = aggregate_repositories(aggregator, store.clone(), repos, 4, &CancellationToken::new()).await;

    let err = outcomes[0].result.as_ref().unwrap_err();
    let aggregate_err = err.downcast_ref::<AggregateError>().unwrap();
    assert!(matches!(
        aggregate_err,
        AggregateError::Collection(CollectError::Page { page: 3, kind: ResourceKind::Stargazers, .. })
    ));
    assert!(outcomes[1].is_success());

    // nothing partial was stored for the failed repository
    assert!(store.find(&RepoRef::new("octo", "gadgets").unwrap()).await.unwrap().is_none());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_second_run_updates_snapshot() {
    let source = Arc::new(FakeSource::new(2).with_repository(widgets()));
    let aggregator = Arc::new(Aggregator::new(source, CollectorConfig::unthrottled()));
    let store = Arc::new(MemoryStore::new());
    let repos = vec![RepoRef::new("octo", "widgets").unwrap()];

    let first = aggregate_repositories(aggregator.clone(), store.clone(), repos.clone(), 1, &CancellationToken::new()).await;
    let second = aggregate_repositories(aggregator, store.clone(), repos, 1, &CancellationToken::new()).await;

    assert_eq!(first[0].result.as_ref().unwrap().1, UpsertOutcome::Inserted);
    assert_eq!(second[0].result.as_ref().unwrap().1, UpsertOutcome::Updated);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_cancelled_run_stores_nothing() {
    let source = Arc::new(FakeSource::new(2).with_repository(widgets()));
    let aggregator = Arc::new(Aggregator::new(source, CollectorConfig::unthrottled()));
    let store = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcomes = aggregate_repositories(
        aggregator,
        store.clone(),
        vec![RepoRef::new("octo", "widgets").unwrap()],
        1,
        &cancel,
    )
    .await;

    let err = outcomes[0].result.as_ref().unwrap_err();
    assert!(err.downcast_ref::<AggregateError>().unwrap().is_cancelled());
    assert!(store.is_empty());
}
