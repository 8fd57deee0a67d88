//! Repository snapshot, the complete result of one aggregation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{is_initialized_age, GraphSeries, WindowCounts};
use crate::output::CompactFormat;
use crate::source::{RepoRef, RepoRefError};

/// Aggregated activity of one repository at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub id: u64,
    pub owner_name: String,
    pub name: String,
    pub default_branch: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub repository_created_months_ago: u32,
    pub total_stars: u64,
    pub total_commits: u64,
    pub star_counts: WindowCounts,
    pub commit_counts: WindowCounts,
    pub stars_per_month: GraphSeries,
    pub aggregated_at: DateTime<Utc>,
}

impl RepositorySnapshot {
    pub fn repo_ref(&self) -> Result<RepoRef, RepoRefError> {
        RepoRef::new(&self.owner_name, &self.name)
    }

    /// Store key, see [`RepoRef::key`]
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner_name, self.name).to_lowercase()
    }

    /// Old enough to show meaningful monthly activity
    pub fn is_initialized(&self) -> bool {
        is_initialized_age(self.repository_created_months_ago)
    }

    pub fn summary(&self) -> RepositorySummary {
        RepositorySummary {
            id: self.id,
            owner_name: self.owner_name.clone(),
            name: self.name.clone(),
            total_stars: self.total_stars,
        }
    }
}

impl CompactFormat for RepositorySnapshot {
    fn to_compact_format(&self) -> String {
        format!(
            "{}/{} | Stars: {} (+{} week, +{} 4 weeks, +{} year) | Commits: {} (+{} week, +{} 4 weeks, +{} year) | Age: {} months",
            self.owner_name,
            self.name,
            self.total_stars,
            self.star_counts.last_week,
            self.star_counts.last_4_weeks,
            self.star_counts.last_12_months,
            self.total_commits,
            self.commit_counts.last_week,
            self.commit_counts.last_4_weeks,
            self.commit_counts.last_12_months,
            self.repository_created_months_ago,
        )
    }
}

/// Listing entry for a stored repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub owner_name: String,
    pub name: String,
    pub total_stars: u64,
}
