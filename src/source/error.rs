//! Remote Source Error Types

use thiserror::Error;

/// Result type for remote source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors returned by an activity source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The repository does not exist or is not visible with the current token
    #[error("Repository {repository} not found on the remote source")]
    NotFound { repository: String },

    /// Credentials were rejected or do not grant access
    #[error("Access to {url} was refused (HTTP {status}). Check GITOMETER_GITHUB_ACCESS_TOKEN or [source] token")]
    Unauthorized { url: String, status: u16 },

    /// Aggregated statistics are still being computed by the remote side
    #[error("Statistics for {repository} are not ready yet; try again shortly")]
    StatsPending { repository: String },

    /// Any other non-success HTTP status
    #[error("Request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body or headers could not be interpreted
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Client construction or configuration problem
    #[error("Source configuration problem: {0}")]
    Configuration(String),
}

impl SourceError {
    pub fn not_found(repository: impl Into<String>) -> Self {
        Self::NotFound { repository: repository.into() }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            let url = error.url().map(|u| u.to_string()).unwrap_or_default();
            Self::decode(url, error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}
