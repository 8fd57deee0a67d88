//! Store Error Types

use std::path::PathBuf;
use thiserror::Error;
use crate::source::RepoRefError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot is stored for the repository
    #[error("No snapshot stored for {repository}")]
    NotFound { repository: String },

    /// The repository is too young for its history to be served
    #[error("{repository} is only {months} months old; history is served from {required} months")]
    NotInitialized {
        repository: String,
        months: u32,
        required: u32,
    },

    /// The snapshot being inserted already exists
    #[error("A snapshot for {repository} already exists")]
    AlreadyExists { repository: String },

    /// The snapshot carries an invalid owner or name
    #[error("Invalid repository in snapshot: {0}")]
    InvalidRepository(#[from] RepoRefError),

    /// Reading or writing the backing file failed
    #[error("Store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file holds malformed data
    #[error("Corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn not_found(repository: impl Into<String>) -> Self {
        Self::NotFound { repository: repository.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Corrupt { path: path.into(), source }
    }
}
