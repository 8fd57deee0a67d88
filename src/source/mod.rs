//! Remote activity source
//!
//! The seam between the aggregation pipeline and the service that holds
//! repository metadata and event history. Sources hand back one page of
//! event timestamps at a time together with pagination metadata; walking the
//! pages is the collector's job.

pub mod error;
pub mod github;
pub mod link;

#[cfg(test)]
pub mod tests;

pub use error::{SourceError, SourceResult};
pub use github::{GitHubClient, GitHubConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::activity::CommitParticipationSeries;

/// Identity of a repository on the remote source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    owner: String,
    name: String,
}

/// A repository identity that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoRefError {
    #[error("Repository owner is missing")]
    MissingOwner,

    #[error("Repository name is missing")]
    MissingName,

    #[error("Invalid characters in '{0}'. Owners and names may only contain letters, digits, '-', '_' and '.'")]
    InvalidCharacters(String),

    #[error("Expected OWNER/NAME, got '{0}'")]
    BadFormat(String),
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static pattern is valid"))
}

impl RepoRef {
    /// Validate and build a repository identity
    pub fn new(owner: &str, name: &str) -> Result<Self, RepoRefError> {
        let owner = owner.trim();
        let name = name.trim();

        if owner.is_empty() {
            return Err(RepoRefError::MissingOwner);
        }
        if name.is_empty() {
            return Err(RepoRefError::MissingName);
        }
        for part in [owner, name] {
            if !slug_pattern().is_match(part) {
                return Err(RepoRefError::InvalidCharacters(part.to_string()));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store key, `owner/name` lower-cased (GitHub identities are case-insensitive)
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name).to_lowercase()
    }
}

impl FromStr for RepoRef {
    type Err = RepoRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('/');
        let trimmed = trimmed
            .strip_prefix("https://github.com/")
            .unwrap_or(trimmed);
        match trimmed.split_once('/') {
            Some((owner, name)) if !name.contains('/') => Self::new(owner, name),
            _ => Err(RepoRefError::BadFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Kind of paginated event listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Stargazer events, timestamp is when the star was given
    Stargazers,
    /// Commits on the default branch, timestamp is the author date
    Commits,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Stargazers => write!(f, "stargazers"),
            ResourceKind::Commits => write!(f, "commits"),
        }
    }
}

/// Pagination metadata of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub first: u32,
    pub last: Option<u32>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            first: 1,
            last: None,
            prev: None,
            next: None,
        }
    }
}

/// One page of event timestamps, in the order the source delivered them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<DateTime<Utc>>,
    pub info: PageInfo,
}

impl Page {
    pub fn new(records: Vec<DateTime<Utc>>, info: PageInfo) -> Self {
        Self { records, info }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Basic repository metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub id: u64,
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub stargazers_count: u64,
}

/// Remote source of repository metadata and activity pages
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Fetch basic repository metadata
    async fn fetch_repository(&self, repo: &RepoRef) -> SourceResult<RepositoryMetadata>;

    /// Fetch one page (1-based) of the given event listing
    async fn fetch_page(&self, repo: &RepoRef, kind: ResourceKind, page: u32) -> SourceResult<Page>;

    /// Fetch the trailing weekly commit totals
    async fn fetch_participation(&self, repo: &RepoRef) -> SourceResult<CommitParticipationSeries>;
}
