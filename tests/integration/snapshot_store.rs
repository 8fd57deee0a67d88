//! Snapshot Store Integration Tests

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{history, metadata, utc, FakeRepository, FakeSource};
use gitometer::aggregation::{Aggregator, RepositorySnapshot};
use gitometer::collector::CollectorConfig;
use gitometer::source::RepoRef;
use gitometer::store::{JsonFileStore, MemoryStore, SnapshotStore, StoreError, UpsertOutcome};

async fn aggregated(owner: &str, name: &str, created: chrono::DateTime<Utc>, stars: u64) -> RepositorySnapshot {
    let source = Arc::new(
        FakeSource::new(3).with_repository(
            FakeRepository::new(metadata(owner, name, created, stars))
                .with_stargazers(history(utc(2023, 1, 2), stars as usize, 30)),
        ),
    );
    let now = Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap();
    Aggregator::new(source, CollectorConfig::unthrottled())
        .aggregate_at(owner, name, &CancellationToken::new(), now)
        .await
        .unwrap()
}

async fn exercise_store(store: &dyn SnapshotStore) {
    let old = aggregated("octo", "old", utc(2020, 5, 1), 8).await;
    let popular = aggregated("octo", "popular", utc(2019, 5, 1), 20).await;
    let young = aggregated("octo", "young", utc(2023, 2, 1), 2).await;

    assert_eq!(store.upsert_snapshot(old.clone()).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_snapshot(popular).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_snapshot(young).await.unwrap(), UpsertOutcome::Inserted);

    // same repository again takes the update path
    assert_eq!(store.upsert_snapshot(old).await.unwrap(), UpsertOutcome::Updated);

    let listing = store.list_summaries().await.unwrap();
    let names: Vec<&str> = listing.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["popular", "old", "young"]);

    let young_ref = RepoRef::new("octo", "young").unwrap();
    assert!(matches!(
        store.fetch_initialized(&young_ref).await,
        Err(StoreError::NotInitialized { months: 1, .. })
    ));
    assert!(store.find(&young_ref).await.unwrap().is_some());

    let old_ref = RepoRef::new("OCTO", "Old").unwrap();
    let snapshot = store.fetch_initialized(&old_ref).await.unwrap();
    assert_eq!(snapshot.total_stars, 8);
    assert_eq!(snapshot.stars_per_month.data.last(), Some(&8));
}

#[tokio::test]
async fn test_memory_store_semantics() {
    exercise_store(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_json_file_store_semantics() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("snapshots.json")).await.unwrap();
    exercise_store(&store).await;
}

#[tokio::test]
async fn test_json_file_store_persists_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshots.json");

    {
        let store = JsonFileStore::open(&path).await.unwrap();
        store.upsert_snapshot(aggregated("octo", "widgets", utc(2021, 1, 1), 5).await).await.unwrap();
    }

    let store = JsonFileStore::open(&path).await.unwrap();
    let summaries = store.list_summaries().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_stars, 5);

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let series = &raw["snapshots"]["octo/widgets"]["stars_per_month"];
    assert_eq!(series["labels"][0], "1 2023");
    assert!(series["data"].is_array());
}

#[tokio::test]
async fn test_concurrent_upserts_of_same_repository() {
    let store = Arc::new(MemoryStore::new());
    let snapshot = aggregated("octo", "widgets", utc(2021, 1, 1), 5).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let snapshot = snapshot.clone();
            tokio::spawn(async move { store.upsert_snapshot(snapshot).await })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == UpsertOutcome::Inserted {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(store.len(), 1);
}
