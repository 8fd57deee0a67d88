//! Command execution

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::aggregation::{Aggregator, RepositorySnapshot};
use crate::output::{self, ColourManager, CompactFormat};
use crate::source::RepoRef;
use crate::store::{SnapshotStore, UpsertOutcome};
use crate::{cli, config};

/// Result of aggregating and storing one repository
#[derive(Debug)]
pub struct RepositoryOutcome {
    pub repo: RepoRef,
    pub result: Result<(RepositorySnapshot, UpsertOutcome)>,
}

impl RepositoryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate every repository and upsert the snapshots, running at most
/// `concurrency` pipelines at a time. Outcomes come back in input order.
pub async fn aggregate_repositories(
    aggregator: Arc<Aggregator>,
    store: Arc<dyn SnapshotStore>,
    repositories: Vec<RepoRef>,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<RepositoryOutcome> {
    let mut outcomes: Vec<(usize, RepositoryOutcome)> = stream::iter(repositories.into_iter().enumerate())
        .map(|(index, repo)| {
            let aggregator = Arc::clone(&aggregator);
            let store = Arc::clone(&store);
            let cancel = cancel.child_token();
            async move {
                let result = aggregate_one(&aggregator, store.as_ref(), &repo, &cancel).await;
                (index, RepositoryOutcome { repo, result })
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn aggregate_one(
    aggregator: &Aggregator,
    store: &dyn SnapshotStore,
    repo: &RepoRef,
    cancel: &CancellationToken,
) -> Result<(RepositorySnapshot, UpsertOutcome)> {
    let snapshot = aggregator
        .aggregate_repo(repo, cancel, chrono::Utc::now())
        .await
        .with_context(|| format!("Failed to aggregate {}", repo))?;

    let outcome = store
        .upsert_snapshot(snapshot.clone())
        .await
        .with_context(|| format!("Failed to store snapshot of {}", repo))?;

    Ok((snapshot, outcome))
}

/// Root token cancelled on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running aggregations");
            token.cancel();
        }
    });
    cancel
}

pub async fn run_command(args: &cli::Args, config: &config::ConfigManager) -> Result<()> {
    let colours = super::initialization::create_colour_manager(args);

    match &args.command {
        cli::Command::Aggregate { repositories, json } => {
            run_aggregate(args, config, repositories, *json, &colours).await
        }
        cli::Command::List => run_list(args, config).await,
        cli::Command::Show { repository, any_age } => run_show(args, config, repository, *any_age).await,
    }
}

async fn run_aggregate(
    args: &cli::Args,
    config: &config::ConfigManager,
    repositories: &[String],
    json: bool,
    colours: &ColourManager,
) -> Result<()> {
    let repositories = super::repository::resolve_repositories(repositories)?;
    let collector_config = super::initialization::collector_config(args, config)?;
    let concurrency = cli::converter::args_to_concurrency(args, config)?;

    let source = super::initialization::create_source(config)?;
    let store: Arc<dyn SnapshotStore> = Arc::new(super::initialization::open_store(args, config).await?);
    let aggregator = Arc::new(Aggregator::new(source, collector_config));

    info!("Aggregating {} repositories ({} at a time)", repositories.len(), concurrency);
    let cancel = cancel_on_interrupt();
    let outcomes = aggregate_repositories(aggregator, store, repositories, concurrency, &cancel).await;

    let total = outcomes.len();
    let mut failed = 0;
    let mut snapshots = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok((snapshot, upsert)) => {
                debug!("{}: {:?}", outcome.repo, upsert);
                if json {
                    snapshots.push(snapshot);
                } else {
                    let status = match upsert {
                        UpsertOutcome::Inserted => colours.success("added"),
                        UpsertOutcome::Updated => colours.success("updated"),
                    };
                    println!("{} {}", status, snapshot.to_compact_format());
                    print!("{}", output::format_activity_table(&snapshot));
                }
            }
            Err(e) => {
                failed += 1;
                error!("{:#}", e);
                eprintln!("{} {}: {:#}", colours.error("failed"), outcome.repo, e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} repositories could not be aggregated", failed, total);
    }
    Ok(())
}

async fn run_list(args: &cli::Args, config: &config::ConfigManager) -> Result<()> {
    let store = super::initialization::open_store(args, config).await?;
    let summaries = store.list_summaries().await?;

    if summaries.is_empty() {
        println!("No repositories stored yet. Run 'gitometer aggregate OWNER/NAME' first.");
    } else {
        print!("{}", output::format_summaries(&summaries));
    }
    Ok(())
}

async fn run_show(args: &cli::Args, config: &config::ConfigManager, repository: &str, any_age: bool) -> Result<()> {
    let repo = super::repository::resolve_repository(repository)?;
    let store = super::initialization::open_store(args, config).await?;

    let snapshot = if any_age {
        store
            .find(&repo)
            .await?
            .ok_or_else(|| crate::store::StoreError::not_found(repo.to_string()))?
    } else {
        store.fetch_initialized(&repo).await?
    };

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
