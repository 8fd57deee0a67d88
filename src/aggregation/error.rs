//! Aggregation Error Types

use thiserror::Error;
use crate::collector::CollectError;
use crate::source::{RepoRefError, SourceError};

/// Result type for aggregation operations
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Failure of a whole aggregation. No partial snapshot is ever produced.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Owner or name failed validation, raised before any remote call
    #[error("Invalid repository: {0}")]
    InvalidRepository(#[from] RepoRefError),

    /// Repository metadata could not be fetched
    #[error("Failed to fetch metadata for {repository}: {source}")]
    Metadata {
        repository: String,
        #[source]
        source: SourceError,
    },

    /// Star or commit collection failed
    #[error("{0}")]
    Collection(#[from] CollectError),
}

impl AggregateError {
    pub fn metadata(repository: impl Into<String>, source: SourceError) -> Self {
        Self::Metadata {
            repository: repository.into(),
            source,
        }
    }

    /// True when the run was stopped by cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Collection(CollectError::Cancelled))
    }
}
